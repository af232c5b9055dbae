//! High-level module interface
//!
//! [`Rn2xx3`] owns the command transport and everything the driver knows about
//! the module: its variant, the join mode and credentials last committed, and
//! the most recent downlink. Every command is answered by exactly one line
//! which is always consumed before the next command is issued.

mod join;
mod tx;

use core::fmt;

use embedded_hal::blocking::delay::DelayMs;

use crate::{
    codec::{self, CodecError},
    config::{
        device::{Credentials, DevAddr, Eui64, JoinMode},
        DriverConfig,
    },
    module::ModuleVariant,
    protocol::{
        commands::{self, format_command, MAX_DATA_RATE, MIN_SLEEP_MS},
        Downlink, FrequencyPlan,
    },
    transport::{Line, Transport},
};

pub use tx::TxStatus;

/// Driver error type
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DeviceError<E> {
    /// Transport fault
    Transport(E),
    /// The module did not identify as a supported model
    UnknownModule,
    /// The credentials needed by the stored join mode are not set
    MissingCredentials,
    /// The network did not accept the join
    JoinDenied,
    /// Payload too large for the current data rate
    InvalidDataLength,
    /// The module rejected the command as malformed
    InvalidParam,
    /// A pre-encoded payload contains bytes that are not hex digits
    InvalidPayload,
    /// Uplink attempt budget used up
    RetriesExhausted,
    /// The module stayed busy for the whole busy budget
    ModuleBusy,
    /// Re-joining after a session error failed
    RejoinFailed,
    /// Frequency plan does not apply to the attached module
    UnsupportedPlan,
    /// A query reply could not be parsed
    UnexpectedResponse,
    /// Formatted command exceeds the command buffer
    CommandTooLong,
    /// The module never answered
    NoResponse,
}

impl<E> From<CodecError> for DeviceError<E> {
    fn from(_: CodecError) -> Self {
        DeviceError::UnexpectedResponse
    }
}

/// RN2483 / RN2903 driver
pub struct Rn2xx3<T: Transport, D: DelayMs<u32>> {
    transport: T,
    delay: D,
    config: DriverConfig,
    variant: ModuleVariant,
    join_mode: JoinMode,
    credentials: Credentials,
    downlink: Option<Downlink>,
}

impl<T: Transport, D: DelayMs<u32>> Rn2xx3<T, D> {
    /// Create a new driver
    ///
    /// The transport must already be connected to the module; nothing is sent
    /// until the first operation.
    pub fn new(mut transport: T, delay: D, config: DriverConfig) -> Self {
        transport.set_timeout(config.command_timeout_ms);
        Self {
            transport,
            delay,
            config,
            variant: ModuleVariant::Unknown,
            join_mode: JoinMode::default(),
            credentials: Credentials::new(),
            downlink: None,
        }
    }

    /// Release the transport and delay
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the driver configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Module variant found by the last identification
    pub fn module_variant(&self) -> ModuleVariant {
        self.variant
    }

    /// Join mode of the last successful join
    pub fn join_mode(&self) -> JoinMode {
        self.join_mode
    }

    /// Credentials of the last successful joins
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Take the pending downlink, if any
    pub fn take_downlink(&mut self) -> Option<Downlink> {
        self.downlink.take()
    }

    /// Identify the attached module
    ///
    /// A timed-out or unrecognised reply resolves to [`ModuleVariant::Unknown`].
    pub fn resolve(&mut self) -> Result<ModuleVariant, DeviceError<T::Error>> {
        let version = self.query(commands::SYS_GET_VER)?;
        self.variant = ModuleVariant::from_version(&version);
        debug!("module {:?} ({})", self.variant, version.as_str());
        Ok(self.variant)
    }

    /// Firmware version string (`sys get ver`)
    pub fn sysver(&mut self) -> Result<Line, DeviceError<T::Error>> {
        self.query(commands::SYS_GET_VER)
    }

    /// Hardware EUI as reported by the module (`sys get hweui`)
    pub fn hweui(&mut self) -> Result<Line, DeviceError<T::Error>> {
        self.query(commands::SYS_GET_HWEUI)
    }

    /// Wake the module and let it detect the host baud rate
    pub fn autobaud(&mut self) -> Result<(), DeviceError<T::Error>> {
        for attempt in 1..=self.config.autobaud_attempts {
            self.delay.delay_ms(self.config.settle_delay_ms);
            self.transport
                .write(&[0x00, 0x55])
                .map_err(DeviceError::Transport)?;
            self.transport.write_line("").map_err(DeviceError::Transport)?;
            self.transport
                .write_line(commands::SYS_GET_VER)
                .map_err(DeviceError::Transport)?;
            let line = self.transport.read_line().map_err(DeviceError::Transport)?;
            if !line.trim().is_empty() {
                debug!("autobaud done after {} attempts", attempt);
                return Ok(());
            }
        }
        warn!("autobaud: no response");
        Err(DeviceError::NoResponse)
    }

    /// Set the uplink data rate (0 to 5)
    ///
    /// Out-of-range values are ignored without contacting the module. The
    /// network may override the data rate after an OTAA join.
    pub fn set_data_rate(&mut self, dr: u8) -> Result<(), DeviceError<T::Error>> {
        if dr > MAX_DATA_RATE {
            debug!("ignoring data rate {}", dr);
            return Ok(());
        }
        self.delay.delay_ms(self.config.command_delay_ms);
        self.transport.drain().map_err(DeviceError::Transport)?;
        self.command_fmt(format_args!("mac set dr {}", dr))?;
        Ok(())
    }

    /// Apply a frequency plan preset
    ///
    /// The module must have been identified (e.g. by a join) and match the plan.
    pub fn set_frequency_plan(&mut self, plan: FrequencyPlan) -> Result<(), DeviceError<T::Error>> {
        if !plan.supports(self.variant) {
            warn!("plan {:?} not supported by {:?}", plan, self.variant);
            return Err(DeviceError::UnsupportedPlan);
        }
        for command in plan.commands() {
            self.send_raw_command(&command)?;
        }
        info!("frequency plan {:?} applied", plan);
        Ok(())
    }

    /// Put the module to sleep for `ms` milliseconds
    ///
    /// Durations under 100 ms are ignored. The module answers when it wakes up;
    /// that line is drained by the next operation.
    pub fn sleep(&mut self, ms: u32) -> Result<(), DeviceError<T::Error>> {
        if ms < MIN_SLEEP_MS {
            return Ok(());
        }
        let command = format_command(format_args!("sys sleep {}", ms))
            .ok_or(DeviceError::CommandTooLong)?;
        trace!("> {}", command.as_str());
        self.transport
            .write_line(&command)
            .map_err(DeviceError::Transport)
    }

    /// Send any command and return the first reply line, trimmed
    pub fn send_raw_command(&mut self, command: &str) -> Result<Line, DeviceError<T::Error>> {
        self.query(command)
    }

    /// Current data rate (`mac get dr`)
    pub fn data_rate(&mut self) -> Result<u8, DeviceError<T::Error>> {
        let line = self.query(commands::MAC_GET_DR)?;
        line.parse().map_err(|_| DeviceError::UnexpectedResponse)
    }

    /// Device EUI configured in the module (`mac get deveui`)
    pub fn dev_eui(&mut self) -> Result<Eui64, DeviceError<T::Error>> {
        let line = self.query(commands::MAC_GET_DEVEUI)?;
        Ok(codec::decode_array(&line)?)
    }

    /// Application EUI configured in the module (`mac get appeui`)
    pub fn app_eui(&mut self) -> Result<Eui64, DeviceError<T::Error>> {
        let line = self.query(commands::MAC_GET_APPEUI)?;
        Ok(codec::decode_array(&line)?)
    }

    /// Device address in use (`mac get devaddr`)
    pub fn dev_addr(&mut self) -> Result<DevAddr, DeviceError<T::Error>> {
        let line = self.query(commands::MAC_GET_DEVADDR)?;
        Ok(codec::decode_array(&line)?)
    }

    /// SNR of the last received packet in dB (`radio get snr`)
    pub fn snr(&mut self) -> Result<i8, DeviceError<T::Error>> {
        let line = self.query(commands::RADIO_GET_SNR)?;
        line.parse().map_err(|_| DeviceError::UnexpectedResponse)
    }

    /// Radio frequency in Hz (`radio get freq`)
    pub fn frequency(&mut self) -> Result<u32, DeviceError<T::Error>> {
        let line = self.query(commands::RADIO_GET_FREQ)?;
        line.parse().map_err(|_| DeviceError::UnexpectedResponse)
    }

    /// Supply voltage in mV (`sys get vdd`)
    pub fn vdd(&mut self) -> Result<u16, DeviceError<T::Error>> {
        let line = self.query(commands::SYS_GET_VDD)?;
        line.parse().map_err(|_| DeviceError::UnexpectedResponse)
    }

    /// Send one command and read its acknowledgement line
    fn command(&mut self, command: &str) -> Result<Line, DeviceError<T::Error>> {
        trace!("> {}", command);
        self.transport
            .write_line(command)
            .map_err(DeviceError::Transport)?;
        let line = self.transport.read_line().map_err(DeviceError::Transport)?;
        trace!("< {}", line.as_str());
        Ok(line)
    }

    fn command_fmt(&mut self, args: fmt::Arguments<'_>) -> Result<Line, DeviceError<T::Error>> {
        let command = format_command(args).ok_or(DeviceError::CommandTooLong)?;
        self.command(&command)
    }

    /// Standalone query: settle, drop stale input, send, return the trimmed reply
    fn query(&mut self, command: &str) -> Result<Line, DeviceError<T::Error>> {
        self.delay.delay_ms(self.config.command_delay_ms);
        self.transport.drain().map_err(DeviceError::Transport)?;
        let line = self.command(command)?;
        let mut trimmed = Line::new();
        // Never longer than the untrimmed line.
        let _ = trimmed.push_str(line.trim());
        Ok(trimmed)
    }

    /// Run `f` with the read timeout set to `timeout_ms`
    ///
    /// The previous timeout is restored whatever `f` returns.
    fn with_timeout<R>(&mut self, timeout_ms: u32, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = self.transport.timeout();
        self.transport.set_timeout(timeout_ms);
        let result = f(self);
        self.transport.set_timeout(previous);
        result
    }
}
