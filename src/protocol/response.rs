use heapless::String;

use crate::codec::{self, CodecError};

/// Longest downlink payload kept, in hex digits
pub const MAX_DOWNLINK_HEX: usize = 484;

/// Module status line, classified by its literal prefix
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Command accepted; an outcome line may follow
    Ok,
    /// Uplink sent (and acknowledged, if confirmed)
    MacTxOk,
    /// Raw radio transmission done
    RadioTxOk,
    /// Uplink sent and a downlink arrived
    MacRx,
    /// Payload too large for the current data rate
    InvalidDataLen,
    /// Malformed command
    InvalidParam,
    /// Uplink failed inside the MAC
    MacErr,
    /// Radio transmission failed
    RadioErr,
    /// No active session
    NotJoined,
    /// Network asked the device to stop transmitting
    Silent,
    /// Frame counter rolled over
    FrameCounterErr,
    /// MAC paused by `mac pause`
    MacPaused,
    /// Module cannot take the command right now
    Busy,
    /// All channels blocked by duty cycle
    NoFreeChannel,
    /// Join succeeded
    Accepted,
    /// Join rejected
    Denied,
    /// Join attempted without keys
    KeysNotInit,
    /// Anything else, including an empty (timed-out) line
    Unknown,
}

/// What the transmit engine does with a classified line
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Read the asynchronous outcome line
    AwaitOutcome,
    /// Transmission done
    Success,
    /// Transmission done, downlink attached
    SuccessWithDownlink,
    /// Give up; retrying the same request cannot help
    Fail,
    /// Join again, then retry
    Rejoin,
    /// Count against the busy budget, wait, retry
    Busy,
    /// Wait, retry
    Wait,
}

const TABLE: &[(&str, Response)] = &[
    ("ok", Response::Ok),
    ("mac_tx_ok", Response::MacTxOk),
    ("radio_tx_ok", Response::RadioTxOk),
    ("mac_rx", Response::MacRx),
    ("invalid_data_len", Response::InvalidDataLen),
    ("invalid_param", Response::InvalidParam),
    ("mac_err", Response::MacErr),
    ("radio_err", Response::RadioErr),
    ("not_joined", Response::NotJoined),
    ("silent", Response::Silent),
    ("frame_counter_err_rejoin_needed", Response::FrameCounterErr),
    ("mac_paused", Response::MacPaused),
    ("busy", Response::Busy),
    ("no_free_ch", Response::NoFreeChannel),
    ("accepted", Response::Accepted),
    ("denied", Response::Denied),
    ("keys_not_init", Response::KeysNotInit),
];

/// Classify a status line by its longest matching prefix
///
/// Matching is case-sensitive; trailing whitespace is ignored.
pub fn classify(line: &str) -> Response {
    let line = line.trim_end();
    TABLE
        .iter()
        .filter(|(prefix, _)| line.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|&(_, response)| response)
        .unwrap_or(Response::Unknown)
}

impl Response {
    /// Recovery action for this line
    pub fn recovery(self) -> Recovery {
        match self {
            Response::Ok => Recovery::AwaitOutcome,
            Response::MacTxOk | Response::RadioTxOk => Recovery::Success,
            Response::MacRx => Recovery::SuccessWithDownlink,
            Response::InvalidDataLen | Response::InvalidParam => Recovery::Fail,
            Response::Busy => Recovery::Busy,
            Response::NoFreeChannel => Recovery::Wait,
            Response::MacErr
            | Response::RadioErr
            | Response::NotJoined
            | Response::Silent
            | Response::FrameCounterErr
            | Response::MacPaused
            | Response::Accepted
            | Response::Denied
            | Response::KeysNotInit
            | Response::Unknown => Recovery::Rejoin,
        }
    }
}

/// Downlink delivered with an uplink outcome
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    /// Application port, 0 if the module reported none
    pub port: u8,
    /// Payload as received, in hex
    pub payload: String<MAX_DOWNLINK_HEX>,
}

impl Downlink {
    /// Parse a `mac_rx <port> <hex>` line
    ///
    /// The payload is everything after the second space-delimited token. A
    /// missing port reads as 0; a port that is not a number in `0..=255` makes
    /// the line unreadable.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end();
        let rest = line.strip_prefix("mac_rx")?;
        let rest = rest.trim_start_matches(' ');
        let (port, payload) = match rest.split_once(' ') {
            Some((port, payload)) => (port, payload),
            None => (rest, ""),
        };

        let port = if port.is_empty() { 0 } else { port.parse().ok()? };

        let mut hex = String::new();
        for c in payload.chars().take(MAX_DOWNLINK_HEX) {
            // Capacity is bounded by the `take` above.
            let _ = hex.push(c);
        }

        Some(Self {
            port,
            payload: hex,
        })
    }

    /// Payload as bytes
    pub fn decode<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, CodecError> {
        codec::decode(&self.payload)
    }
}
