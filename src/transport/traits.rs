use heapless::String;

/// Longest response line the driver keeps
///
/// Large enough for `mac_rx <port> ` followed by a maximum-size downlink.
pub const MAX_LINE_LEN: usize = 512;

/// One response line, without its line terminator
pub type Line = String<MAX_LINE_LEN>;

/// Line-oriented command channel to the module
///
/// The driver assumes exclusive use of the channel for its whole lifetime.
pub trait Transport {
    /// Error type for hard I/O faults
    ///
    /// A read timeout is not an error; see [`Transport::read_line`].
    type Error;

    /// Write raw bytes
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read one line, blocking up to the current timeout
    ///
    /// Returns whatever was received before the timeout elapsed, which may be
    /// an empty or partial line. The CR/LF terminator is not included.
    fn read_line(&mut self) -> Result<Line, Self::Error>;

    /// Discard any input that is already buffered
    fn drain(&mut self) -> Result<(), Self::Error>;

    /// Set the read timeout in milliseconds
    fn set_timeout(&mut self, timeout_ms: u32);

    /// Get the read timeout in milliseconds
    fn timeout(&self) -> u32;

    /// Write `line` followed by CRLF
    fn write_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.write(line.as_bytes())?;
        self.write(b"\r\n")
    }
}
