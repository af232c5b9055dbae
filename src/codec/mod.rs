//! Hex encoding for module payloads and keys
//!
//! The module expects every payload, key and identifier as ASCII hex, two
//! digits per byte with no separator. Encoding always produces uppercase
//! digits, decoding accepts either case.

use core::fmt;

use heapless::{String, Vec};

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Hex codec error
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Input has an odd number of hex digits
    OddLength,
    /// Input contains a character that is not a hex digit
    InvalidDigit,
    /// Output buffer cannot hold the result
    BufferTooSmall,
    /// Decoded length does not match the expected fixed length
    LengthMismatch,
}

/// Encode a single byte as two uppercase hex digits
pub fn encode_byte(byte: u8) -> [u8; 2] {
    [
        HEX_DIGITS[(byte >> 4) as usize],
        HEX_DIGITS[(byte & 0x0F) as usize],
    ]
}

/// Encode `bytes` into a fixed-capacity string
pub fn encode<const N: usize>(bytes: &[u8]) -> Result<String<N>, CodecError> {
    let mut out = String::new();
    for &byte in bytes {
        for digit in encode_byte(byte) {
            out.push(digit as char)
                .map_err(|_| CodecError::BufferTooSmall)?;
        }
    }
    Ok(out)
}

fn nibble(digit: u8) -> Result<u8, CodecError> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        _ => Err(CodecError::InvalidDigit),
    }
}

/// Decode hex text into `out`, returning the number of bytes written
///
/// Surrounding whitespace is ignored.
pub fn decode_into(hex: &str, out: &mut [u8]) -> Result<usize, CodecError> {
    let digits = hex.trim().as_bytes();
    if digits.len() % 2 != 0 {
        return Err(CodecError::OddLength);
    }
    let len = digits.len() / 2;
    if len > out.len() {
        return Err(CodecError::BufferTooSmall);
    }
    for (slot, pair) in out.iter_mut().zip(digits.chunks_exact(2)) {
        *slot = (nibble(pair[0])? << 4) | nibble(pair[1])?;
    }
    Ok(len)
}

/// Decode hex text into a fixed-capacity vector
pub fn decode<const N: usize>(hex: &str) -> Result<Vec<u8, N>, CodecError> {
    let mut buffer = [0u8; N];
    let len = decode_into(hex, &mut buffer)?;
    Vec::from_slice(&buffer[..len]).map_err(|_| CodecError::BufferTooSmall)
}

/// Decode hex text that must describe exactly `N` bytes
///
/// Used for keys and identifiers, e.g. `decode_array::<16>(app_key_hex)`.
pub fn decode_array<const N: usize>(hex: &str) -> Result<[u8; N], CodecError> {
    let mut out = [0u8; N];
    if hex.trim().len() != N * 2 {
        return Err(CodecError::LengthMismatch);
    }
    decode_into(hex, &mut out)?;
    Ok(out)
}

/// `Display` adapter writing bytes as uppercase hex
///
/// Lets commands be formatted without an intermediate buffer:
/// `write!(cmd, "mac set appkey {}", Hex(&key))`.
#[derive(Debug, Clone, Copy)]
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            let [hi, lo] = encode_byte(byte);
            fmt::Write::write_char(f, hi as char)?;
            fmt::Write::write_char(f, lo as char)?;
        }
        Ok(())
    }
}
