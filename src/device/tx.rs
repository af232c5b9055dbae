//! Uplink transmission with response classification and recovery

use embedded_hal::blocking::delay::DelayMs;

use super::{DeviceError, Rn2xx3};
use crate::{
    codec,
    protocol::{
        classify,
        commands::{format_command, TxKind},
        Downlink, Recovery, Response,
    },
    transport::Transport,
};

/// Result of a successful transmission
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Uplink sent
    Sent,
    /// Uplink sent and a downlink is waiting in [`Rn2xx3::take_downlink`]
    SentWithDownlink,
}

/// Outcome of one uplink attempt, acted on by the retry loop
enum Step {
    Done(TxStatus),
    Abort(Response),
    Busy,
    Wait,
    NeedsRejoin,
}

impl<T: Transport, D: DelayMs<u32>> Rn2xx3<T, D> {
    /// Send text as an unconfirmed uplink
    pub fn tx(&mut self, text: &str) -> Result<TxStatus, DeviceError<T::Error>> {
        self.tx_uncnf(text)
    }

    /// Send text as a confirmed uplink
    pub fn tx_cnf(&mut self, text: &str) -> Result<TxStatus, DeviceError<T::Error>> {
        self.tx_command(TxKind::Confirmed, text.as_bytes(), true)
    }

    /// Send text as an unconfirmed uplink
    pub fn tx_uncnf(&mut self, text: &str) -> Result<TxStatus, DeviceError<T::Error>> {
        self.tx_command(TxKind::Unconfirmed, text.as_bytes(), true)
    }

    /// Send raw bytes as an unconfirmed uplink
    pub fn tx_bytes(&mut self, data: &[u8]) -> Result<TxStatus, DeviceError<T::Error>> {
        self.tx_command(TxKind::Unconfirmed, data, true)
    }

    /// Send an uplink, retrying and re-joining as the module's replies require
    ///
    /// With `encode` the payload is hex-encoded on the way out; otherwise it
    /// must already be hex text and anything else fails with
    /// [`DeviceError::InvalidPayload`] before any I/O. At most `max_tx_attempts` uplinks are sent,
    /// busy retries included. A successful re-join resets the busy count but
    /// not the attempt count.
    pub fn tx_command(
        &mut self,
        kind: TxKind,
        payload: &[u8],
        encode: bool,
    ) -> Result<TxStatus, DeviceError<T::Error>> {
        if !encode && !payload.iter().all(u8::is_ascii_hexdigit) {
            return Err(DeviceError::InvalidPayload);
        }
        self.transport.drain().map_err(DeviceError::Transport)?;

        let mut attempts: u8 = 0;
        let mut busy: u8 = 0;
        loop {
            if attempts >= self.config.max_tx_attempts {
                warn!("uplink failed after {} attempts", attempts);
                return Err(DeviceError::RetriesExhausted);
            }
            attempts += 1;

            match self.tx_attempt(kind, payload, encode)? {
                Step::Done(status) => return Ok(status),
                Step::Abort(Response::InvalidDataLen) => return Err(DeviceError::InvalidDataLength),
                Step::Abort(_) => return Err(DeviceError::InvalidParam),
                Step::Busy => {
                    busy += 1;
                    if busy >= self.config.max_busy {
                        warn!("module busy {} times", busy);
                        return Err(DeviceError::ModuleBusy);
                    }
                    self.delay.delay_ms(self.config.retry_delay_ms);
                }
                Step::Wait => self.delay.delay_ms(self.config.retry_delay_ms),
                Step::NeedsRejoin => {
                    // No attempt left to use the new session
                    if attempts >= self.config.max_tx_attempts {
                        warn!("session lost on the last attempt");
                        return Err(DeviceError::RetriesExhausted);
                    }
                    warn!("session lost, joining again");
                    match self.join() {
                        Ok(()) => busy = 0,
                        Err(DeviceError::Transport(e)) => return Err(DeviceError::Transport(e)),
                        Err(_) => return Err(DeviceError::RejoinFailed),
                    }
                }
            }
        }
    }

    fn tx_attempt(
        &mut self,
        kind: TxKind,
        payload: &[u8],
        encode: bool,
    ) -> Result<Step, DeviceError<T::Error>> {
        self.write_uplink(kind, payload, encode)?;

        let mut line = self.transport.read_line().map_err(DeviceError::Transport)?;
        trace!("< {}", line.as_str());
        let mut response = classify(&line);

        if response == Response::Ok {
            line = self
                .with_timeout(self.config.network_timeout_ms, |dev| dev.transport.read_line())
                .map_err(DeviceError::Transport)?;
            trace!("< {}", line.as_str());
            response = match classify(&line) {
                Response::Ok => Response::Unknown,
                outcome => outcome,
            };
        }
        debug!("uplink: {:?}", response);

        Ok(match response.recovery() {
            Recovery::Success => Step::Done(TxStatus::Sent),
            Recovery::SuccessWithDownlink => match Downlink::parse(&line) {
                Some(downlink) => {
                    self.downlink = Some(downlink);
                    Step::Done(TxStatus::SentWithDownlink)
                }
                None => {
                    warn!("unreadable downlink dropped");
                    Step::Done(TxStatus::Sent)
                }
            },
            Recovery::Fail => Step::Abort(response),
            Recovery::Busy => Step::Busy,
            Recovery::Wait => Step::Wait,
            Recovery::Rejoin | Recovery::AwaitOutcome => Step::NeedsRejoin,
        })
    }

    /// Write `mac tx <kind> <port> <payload>` without buffering the payload
    fn write_uplink(
        &mut self,
        kind: TxKind,
        payload: &[u8],
        encode: bool,
    ) -> Result<(), DeviceError<T::Error>> {
        let prefix = format_command(format_args!("mac tx {} {} ", kind.as_str(), self.config.tx_port))
            .ok_or(DeviceError::CommandTooLong)?;
        trace!("> {}<{} bytes>", prefix.as_str(), payload.len());

        self.transport
            .write(prefix.as_bytes())
            .map_err(DeviceError::Transport)?;
        if encode {
            for &byte in payload {
                self.transport
                    .write(&codec::encode_byte(byte))
                    .map_err(DeviceError::Transport)?;
            }
        } else {
            self.transport.write(payload).map_err(DeviceError::Transport)?;
        }
        self.transport.write(b"\r\n").map_err(DeviceError::Transport)
    }
}
