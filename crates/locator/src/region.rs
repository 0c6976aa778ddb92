use crate::codec::{encode_text, find_aligned, is_hex_buffer};
use crate::error::{LocatorError, Result};
use std::ops::Range;

/// Whether the end marker belongs to the located region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerPosition {
    /// Region stops right before the end marker.
    #[default]
    Exclude,
    /// Region runs through the end of the end marker.
    Include,
}

/// Offsets into a hex buffer. Always even, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedRegion {
    pub start: usize,
    pub end: usize,
}

impl DelimitedRegion {
    pub fn new(start: usize, end: usize, buffer_len: usize) -> Result<Self> {
        if start > end || end > buffer_len || start % 2 != 0 || end % 2 != 0 {
            return Err(LocatorError::InvalidRegion {
                start,
                end,
                len: buffer_len,
            });
        }
        Ok(Self { start, end })
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The same region expressed over the decoded bytes.
    pub fn byte_range(&self) -> Range<usize> {
        self.start / 2..self.end / 2
    }

    /// Pull `end` back over trailing ASCII whitespace (space, tab, CR, LF)
    /// inside the region.
    pub fn trim_end_whitespace(self, hex_buffer: &str) -> Self {
        let mut end = self.end;
        while end > self.start {
            match hex_buffer.get(end - 2..end) {
                Some("20" | "09" | "0d" | "0a") => end -= 2,
                _ => break,
            }
        }
        Self { end, ..self }
    }

    pub fn slice<'a>(&self, hex_buffer: &'a str) -> Result<&'a str> {
        hex_buffer
            .get(self.start..self.end)
            .ok_or(LocatorError::InvalidRegion {
                start: self.start,
                end: self.end,
                len: hex_buffer.len(),
            })
    }
}

/// Find the region bounded by the first `start_marker` and the first
/// `end_marker` that follows it.
///
/// Markers are plain text; they are hex-encoded before searching.
pub fn locate(
    hex_buffer: &str,
    start_marker: &str,
    end_marker: &str,
    position: MarkerPosition,
) -> Result<DelimitedRegion> {
    let start_hex = encode_text(start_marker);
    let end_hex = encode_text(end_marker);
    let not_found = || LocatorError::region_not_found(start_marker, end_marker);

    let start = find_aligned(hex_buffer, &start_hex, 0).ok_or_else(not_found)? + start_hex.len();
    let end_at = find_aligned(hex_buffer, &end_hex, start).ok_or_else(not_found)?;
    let end = match position {
        MarkerPosition::Exclude => end_at,
        MarkerPosition::Include => end_at + end_hex.len(),
    };
    DelimitedRegion::new(start, end, hex_buffer.len())
}

/// Splice `new_content_hex` over `region`. The surrounding markers are not
/// re-validated.
pub fn replace(hex_buffer: &str, region: DelimitedRegion, new_content_hex: &str) -> Result<String> {
    let region = DelimitedRegion::new(region.start, region.end, hex_buffer.len())?;
    if !is_hex_buffer(new_content_hex) {
        return Err(LocatorError::invalid_encoding(
            "replacement is not a lowercase hex buffer",
        ));
    }
    let mut out =
        String::with_capacity(hex_buffer.len() - region.len() + new_content_hex.len());
    out.push_str(&hex_buffer[..region.start]);
    out.push_str(new_content_hex);
    out.push_str(&hex_buffer[region.end..]);
    Ok(out)
}
