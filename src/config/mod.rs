//! Driver and device configuration
//!
//! This module contains:
//! - Device credentials (EUIs, keys, device address) and the join mode
//! - Driver timing and retry parameters

/// Device credentials and join mode
pub mod device;

/// Driver timing and retry parameters
pub mod driver;

pub use device::{AesKey, Credentials, DevAddr, Eui64, JoinMode};
pub use driver::DriverConfig;
