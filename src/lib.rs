//! Driver for Microchip RN2483 / RN2903 LoRaWAN modules
//!
//! The modules run the LoRaWAN stack in firmware and are controlled through a
//! line-based ASCII command interface over UART. This crate drives that
//! interface: it identifies the module, joins a network (ABP or OTAA), sends
//! uplinks with retry and re-join recovery, and surfaces downlinks.
//!
//! # Features
//! - RN2483 (868 MHz) and RN2903 (915 MHz) detection
//! - OTAA and ABP activation with automatic re-join
//! - Confirmed and unconfirmed uplinks, downlink capture
//! - Frequency plan presets for TTN EU868 and US915
//! - `no_std`, no allocation
//! - Optional `defmt` or `log` output
//!
//! # Example
//! ```no_run
//! use rn2xx3::{
//!     codec,
//!     config::DriverConfig,
//!     device::{Rn2xx3, TxStatus},
//!     transport::SerialTransport,
//! };
//!
//! # fn run<S, D>(uart: S, delay_us: D, delay_ms: impl embedded_hal::blocking::delay::DelayMs<u32>)
//! # where
//! #     S: embedded_hal::serial::Read<u8> + embedded_hal::serial::Write<u8>,
//! #     D: embedded_hal::blocking::delay::DelayUs<u32>,
//! # {
//! let transport = SerialTransport::new(uart, delay_us);
//! let mut module = Rn2xx3::new(transport, delay_ms, DriverConfig::default());
//!
//! let app_eui = codec::decode_array::<8>("70B3D57ED00001A6").unwrap();
//! let app_key = codec::decode_array::<16>("A23C96EE13804963F8C2BD6285448198").unwrap();
//! if module.join_otaa(app_eui, app_key, None).is_ok() {
//!     if let Ok(TxStatus::SentWithDownlink) = module.tx_cnf("hello") {
//!         let downlink = module.take_downlink();
//!     }
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![no_std]

#[macro_use]
mod fmt;

/// Hex encoding of payloads and keys
pub mod codec;

/// Driver and device configuration
pub mod config;

/// High-level module interface
pub mod device;

/// Module identification
pub mod module;

/// Module command protocol
pub mod protocol;

/// Command transport abstraction
pub mod transport;

pub use device::{DeviceError, Rn2xx3, TxStatus};
pub use module::ModuleVariant;
