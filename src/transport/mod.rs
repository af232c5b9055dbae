/// embedded-hal UART adapter
pub mod serial;
/// Transport trait
pub mod traits;

pub use serial::{SerialError, SerialTransport};
pub use traits::{Line, Transport, MAX_LINE_LEN};
