//! Frame validation and tag payload decoding.
//!
//! The WL-134 style reader sends a 26-character ASCII-hex body followed by
//! an XOR checksum of the body bytes and its bitwise inverse. The body's
//! uppercase text is the stable identity key; the two integer views are
//! the same 13 bytes read big-endian and byte-reversed.

use core::fmt::Write as _;

use serde::Serialize;

use super::frame::{ETX, Frame, STX};
use crate::error::FrameError;

/// Characters in a tag body.
pub const TAG_HEX_LEN: usize = 26;

/// Uppercase 26-hex identity key.
pub type TagKey = heapless::String<TAG_HEX_LEN>;

/// A decoded, validated tag read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityPacket {
    pub hex_key: TagKey,
    /// Body interpreted as one big-endian 104-bit integer.
    pub id_be: u128,
    /// Body with its byte pairs reversed, then interpreted the same way.
    pub id_le: u128,
    /// Hex dump of the raw body bytes.
    pub raw_hex: heapless::String<{ 2 * TAG_HEX_LEN }>,
    pub time_ms: u64,
}

/// Check markers, checksum and (optionally) the inverse byte.
///
/// Returns the body slice on success.
pub fn validate_frame(frame: &[u8], invert_required: bool) -> Result<&[u8], FrameError> {
    if frame.len() < 2 || frame[0] != STX || frame[frame.len() - 1] != ETX {
        return Err(FrameError::Malformed);
    }
    let payload = &frame[1..frame.len() - 1];
    if payload.len() < 2 {
        return Err(FrameError::Malformed);
    }

    let (body, trailer) = payload.split_at(payload.len() - 2);
    let (checksum, invert) = (trailer[0], trailer[1]);

    let computed = xor_checksum(body);
    if computed != checksum {
        return Err(FrameError::ChecksumMismatch {
            computed,
            received: checksum,
        });
    }
    if invert_required && checksum ^ invert != 0xFF {
        return Err(FrameError::InvertMismatch { checksum, invert });
    }
    Ok(body)
}

/// Decode a 26-character hex body (case-insensitive).
pub fn parse_body(body: &[u8], time_ms: u64) -> Result<IdentityPacket, FrameError> {
    if body.len() != TAG_HEX_LEN || !body.iter().all(u8::is_ascii_hexdigit) {
        return Err(FrameError::Malformed);
    }

    let mut hex_key = TagKey::new();
    let mut id_be: u128 = 0;
    for &c in body {
        let upper = c.to_ascii_uppercase();
        hex_key.push(upper as char).map_err(|()| FrameError::Malformed)?;
        id_be = (id_be << 4) | u128::from(hex_value(upper));
    }

    let mut id_le: u128 = 0;
    for pair in body.rchunks(2) {
        for &c in pair {
            id_le = (id_le << 4) | u128::from(hex_value(c.to_ascii_uppercase()));
        }
    }

    let mut raw_hex = heapless::String::new();
    for &b in body {
        write!(raw_hex, "{b:02X}").map_err(|_| FrameError::Malformed)?;
    }

    Ok(IdentityPacket {
        hex_key,
        id_be,
        id_le,
        raw_hex,
        time_ms,
    })
}

/// Wrap `body` as `STX | body | checksum | invert | ETX`.
///
/// Returns `None` if the result would not fit in a [`Frame`].
pub fn encode_frame(body: &[u8]) -> Option<Frame> {
    let checksum = xor_checksum(body);
    let mut frame = Frame::new();
    frame.push(STX).ok()?;
    frame.extend_from_slice(body).ok()?;
    frame.push(checksum).ok()?;
    frame.push(!checksum).ok()?;
    frame.push(ETX).ok()?;
    Some(frame)
}

pub fn xor_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

fn hex_value(upper: u8) -> u8 {
    match upper {
        b'0'..=b'9' => upper - b'0',
        b'A'..=b'F' => upper - b'A' + 10,
        _ => 0,
    }
}
