use core::fmt::{self, Write};

use heapless::String;

/// Longest command the driver formats in one piece
///
/// Uplink payloads are streamed separately and do not count against it.
pub const MAX_COMMAND_LEN: usize = 64;

/// Formatted command text
pub type Command = String<MAX_COMMAND_LEN>;

pub(crate) const SYS_GET_VER: &str = "sys get ver";
pub(crate) const SYS_GET_HWEUI: &str = "sys get hweui";
pub(crate) const SYS_GET_VDD: &str = "sys get vdd";
pub(crate) const MAC_GET_DR: &str = "mac get dr";
pub(crate) const MAC_GET_DEVEUI: &str = "mac get deveui";
pub(crate) const MAC_GET_APPEUI: &str = "mac get appeui";
pub(crate) const MAC_GET_DEVADDR: &str = "mac get devaddr";
pub(crate) const RADIO_GET_SNR: &str = "radio get snr";
pub(crate) const RADIO_GET_FREQ: &str = "radio get freq";
pub(crate) const MAC_SAVE: &str = "mac save";
pub(crate) const MAC_SET_ADR_OFF: &str = "mac set adr off";
pub(crate) const MAC_SET_AR_OFF: &str = "mac set ar off";
pub(crate) const MAC_SET_RX2_EU: &str = "mac set rx2 3 869525000";

/// Highest data rate accepted by `mac set dr`
pub const MAX_DATA_RATE: u8 = 5;
/// Shortest sleep the module accepts, in milliseconds
pub const MIN_SLEEP_MS: u32 = 100;

/// Uplink acknowledgement mode
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// The network acknowledges the uplink
    Confirmed,
    /// Fire and forget
    Unconfirmed,
}

impl TxKind {
    /// Argument of `mac tx` for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Confirmed => "cnf",
            TxKind::Unconfirmed => "uncnf",
        }
    }
}

/// Activation argument of `mac join`
pub(crate) fn join_command(otaa: bool) -> &'static str {
    if otaa {
        "mac join otaa"
    } else {
        "mac join abp"
    }
}

/// Format a command into a fixed-capacity buffer
///
/// Returns `None` when the text does not fit.
pub fn format_command(args: fmt::Arguments<'_>) -> Option<Command> {
    let mut command = Command::new();
    command.write_fmt(args).ok()?;
    Some(command)
}
