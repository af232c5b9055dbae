//! Module command protocol
//!
//! This module contains the text protocol spoken by the module:
//! - Command vocabulary
//! - Status line classification and downlink parsing
//! - Frequency plan presets

/// Command vocabulary
pub mod commands;

/// Frequency plan presets
pub mod plan;

/// Status line classification
pub mod response;

pub use commands::{Command, TxKind, MAX_COMMAND_LEN};
pub use plan::FrequencyPlan;
pub use response::{classify, Downlink, Recovery, Response};
