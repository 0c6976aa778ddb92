use thiserror::Error;

/// Result type for locator operations
pub type Result<T> = std::result::Result<T, LocatorError>;

/// Errors raised while encoding or slicing a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Input was not valid in the declared encoding
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A bounding marker is absent from the buffer
    #[error("Region not found between {start_marker:?} and {end_marker:?}")]
    RegionNotFound {
        start_marker: String,
        end_marker: String,
    },

    /// Offsets fall outside the buffer or split a byte
    #[error("Invalid region: start={start}, end={end}, len={len}")]
    InvalidRegion { start: usize, end: usize, len: usize },
}

impl LocatorError {
    pub fn invalid_encoding(msg: impl Into<String>) -> Self {
        Self::InvalidEncoding(msg.into())
    }

    pub fn region_not_found(start_marker: &str, end_marker: &str) -> Self {
        Self::RegionNotFound {
            start_marker: start_marker.to_string(),
            end_marker: end_marker.to_string(),
        }
    }
}
