use embedded_hal::{
    blocking::delay::DelayUs,
    serial::{Read, Write},
};

use crate::transport::traits::{Line, Transport};

/// Polling interval while waiting for serial input, in microseconds
///
/// One byte at the module's default 57600 baud takes about 174 us.
const POLL_INTERVAL_US: u32 = 50;

/// Default read timeout until the driver configures its own
const DEFAULT_TIMEOUT_MS: u32 = 2_000;

/// Serial transport errors
#[derive(Debug)]
pub enum SerialError<R, W> {
    /// Receiving failed
    Read(R),
    /// Transmitting failed
    Write(W),
}

/// [`Transport`] over an embedded-hal UART
///
/// Reads are polled; the timeout is measured by counting poll intervals, so it
/// is a lower bound rather than an exact wall-clock limit. The timeout bounds
/// the total idle time across a whole line; a received byte does not restart it.
pub struct SerialTransport<S, D>
where
    S: Read<u8> + Write<u8>,
    D: DelayUs<u32>,
{
    serial: S,
    delay: D,
    timeout_ms: u32,
}

impl<S, D> SerialTransport<S, D>
where
    S: Read<u8> + Write<u8>,
    D: DelayUs<u32>,
{
    /// Create a new transport; the UART must already run at the module's baud rate
    pub fn new(serial: S, delay: D) -> Self {
        Self {
            serial,
            delay,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Release the UART and delay
    pub fn release(self) -> (S, D) {
        (self.serial, self.delay)
    }
}

impl<S, D> Transport for SerialTransport<S, D>
where
    S: Read<u8> + Write<u8>,
    D: DelayUs<u32>,
{
    type Error = SerialError<<S as Read<u8>>::Error, <S as Write<u8>>::Error>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        for &byte in bytes {
            nb::block!(self.serial.write(byte)).map_err(SerialError::Write)?;
        }
        nb::block!(self.serial.flush()).map_err(SerialError::Write)
    }

    fn read_line(&mut self) -> Result<Line, Self::Error> {
        let mut line = Line::new();
        let budget_us = u64::from(self.timeout_ms) * 1_000;
        let mut waited_us: u64 = 0;

        loop {
            match self.serial.read() {
                Ok(b'\n') => break,
                Ok(b'\r') => {}
                Ok(byte) => {
                    // Overlong lines are truncated; the rest is still consumed.
                    let _ = line.push(char::from(byte));
                }
                Err(nb::Error::WouldBlock) => {
                    if waited_us >= budget_us {
                        break;
                    }
                    self.delay.delay_us(POLL_INTERVAL_US);
                    waited_us += u64::from(POLL_INTERVAL_US);
                }
                Err(nb::Error::Other(e)) => return Err(SerialError::Read(e)),
            }
        }

        Ok(line)
    }

    fn drain(&mut self) -> Result<(), Self::Error> {
        loop {
            match self.serial.read() {
                Ok(_) => {}
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(SerialError::Read(e)),
            }
        }
    }

    fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    fn timeout(&self) -> u32 {
        self.timeout_ms
    }
}
