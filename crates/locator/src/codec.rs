use crate::error::{LocatorError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// How the input handed to [`encode`] should be read before hex-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// Bytes are taken as-is.
    Raw,
    /// Bytes must be valid UTF-8.
    Utf8,
    /// Input is base64 text; ASCII whitespace (line wrapping) is ignored.
    Base64,
}

/// Lowercase hex, two characters per byte.
pub fn encode(input: impl AsRef<[u8]>, encoding: SourceEncoding) -> Result<String> {
    let input = input.as_ref();
    match encoding {
        SourceEncoding::Raw => Ok(hex::encode(input)),
        SourceEncoding::Utf8 => {
            std::str::from_utf8(input)
                .map_err(|err| LocatorError::invalid_encoding(format!("utf-8: {err}")))?;
            Ok(hex::encode(input))
        }
        SourceEncoding::Base64 => Ok(hex::encode(decode_base64(input)?)),
    }
}

/// Hex of a text marker. Infallible since `&str` is always UTF-8.
pub fn encode_text(text: &str) -> String {
    hex::encode(text.as_bytes())
}

pub fn decode(hex_buffer: &str) -> Result<Vec<u8>> {
    hex::decode(hex_buffer).map_err(|err| LocatorError::invalid_encoding(format!("hex: {err}")))
}

pub fn decode_text(hex_buffer: &str) -> Result<String> {
    String::from_utf8(decode(hex_buffer)?)
        .map_err(|err| LocatorError::invalid_encoding(format!("utf-8: {err}")))
}

pub fn decode_base64(input: impl AsRef<[u8]>) -> Result<Vec<u8>> {
    let compact: Vec<u8> = input
        .as_ref()
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD
        .decode(compact)
        .map_err(|err| LocatorError::invalid_encoding(format!("base64: {err}")))
}

pub fn to_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// First byte-aligned occurrence of `needle` in `haystack` at or after `from`.
///
/// Both arguments are hex strings; odd offsets are skipped so a marker never
/// matches across a byte boundary.
pub fn find_aligned(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    let start = from + (from % 2);
    let last = haystack.len().checked_sub(needle.len())?;
    let hay = haystack.as_bytes();
    let pin = needle.as_bytes();
    (start..=last)
        .step_by(2)
        .find(|&idx| &hay[idx..idx + pin.len()] == pin)
}

/// Whether `candidate` is a well-formed buffer produced by [`encode`].
pub fn is_hex_buffer(candidate: &str) -> bool {
    candidate.len() % 2 == 0
        && candidate
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
