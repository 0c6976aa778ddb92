//! # Phenoflow Locator
//!
//! Marker-bounded reads and edits over semi-structured text, performed on a
//! hex rendering of the bytes.
//!
//! ```text
//! bytes ──> hex (2 chars / byte)
//!            │
//!            ├──> locate(start marker, end marker) ──> DelimitedRegion
//!            │
//!            └──> replace(region, new hex) ──> hex ──> bytes
//! ```
//!
//! Searching hex instead of `str` means a region boundary can never land
//! inside a multi-byte character.
//!
//! ## Example
//!
//! ```rust
//! use phenoflow_locator::{HexDocument, MarkerPosition};
//!
//! let mut doc = HexDocument::from_text("doc: old\nid: step");
//! assert_eq!(doc.extract("doc: ", "\nid: ", MarkerPosition::Exclude).unwrap(), "old");
//! doc.rewrite("doc: ", "\nid: ", "new").unwrap();
//! assert_eq!(doc.to_text().unwrap(), "doc: new\nid: step");
//! ```

pub mod codec;
mod document;
mod error;
mod region;

pub use codec::SourceEncoding;
pub use document::HexDocument;
pub use error::{LocatorError, Result};
pub use region::{locate, replace, DelimitedRegion, MarkerPosition};
