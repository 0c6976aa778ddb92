use crate::codec::{self, SourceEncoding};
use crate::error::Result;
use crate::region::{locate, replace, DelimitedRegion, MarkerPosition};

/// A document held as a hex buffer for marker-based reads and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexDocument {
    buffer: String,
}

impl HexDocument {
    pub fn from_text(text: &str) -> Self {
        Self {
            buffer: codec::encode_text(text),
        }
    }

    /// Parse store content (base64, possibly line-wrapped).
    pub fn from_base64(content: &str) -> Result<Self> {
        Ok(Self {
            buffer: codec::encode(content, SourceEncoding::Base64)?,
        })
    }

    pub fn as_hex(&self) -> &str {
        &self.buffer
    }

    pub fn locate(
        &self,
        start_marker: &str,
        end_marker: &str,
        position: MarkerPosition,
    ) -> Result<DelimitedRegion> {
        locate(&self.buffer, start_marker, end_marker, position)
    }

    /// Decoded text of the region between the markers.
    pub fn extract(
        &self,
        start_marker: &str,
        end_marker: &str,
        position: MarkerPosition,
    ) -> Result<String> {
        let region = self.locate(start_marker, end_marker, position)?;
        self.text_at(region)
    }

    pub fn text_at(&self, region: DelimitedRegion) -> Result<String> {
        codec::decode_text(region.slice(&self.buffer)?)
    }

    /// Overwrite the region between the markers with `text`.
    pub fn rewrite(&mut self, start_marker: &str, end_marker: &str, text: &str) -> Result<()> {
        let region = self.locate(start_marker, end_marker, MarkerPosition::Exclude)?;
        self.splice(region, text)
    }

    /// Overwrite `region` with `text`.
    pub fn splice(&mut self, region: DelimitedRegion, text: &str) -> Result<()> {
        self.buffer = replace(&self.buffer, region, &codec::encode_text(text))?;
        Ok(())
    }

    pub fn to_text(&self) -> Result<String> {
        codec::decode_text(&self.buffer)
    }

    pub fn to_base64(&self) -> Result<String> {
        Ok(codec::to_base64(codec::decode(&self.buffer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rewrite_round_trips_through_base64() {
        let original = "# demo\n\nDEMO - a test\n\n## Usage\n";
        let mut doc = HexDocument::from_base64(&codec::to_base64(original)).unwrap();
        assert_eq!(
            doc.extract("- ", "\n\n##", MarkerPosition::Exclude).unwrap(),
            "a test"
        );

        doc.rewrite("- ", "\n\n##", "NEW").unwrap();
        let reread = HexDocument::from_base64(&doc.to_base64().unwrap()).unwrap();
        assert_eq!(reread.to_text().unwrap(), "# demo\n\nDEMO - NEW\n\n## Usage\n");
    }

    #[test]
    fn trimmed_region_keeps_line_endings() {
        let mut doc = HexDocument::from_text("ID - old \r\n\r\n## Usage\r\n");
        let region = doc
            .locate("- ", "##", MarkerPosition::Exclude)
            .unwrap()
            .trim_end_whitespace(doc.as_hex());
        assert_eq!(doc.text_at(region).unwrap(), "old");

        doc.splice(region, "new").unwrap();
        assert_eq!(doc.to_text().unwrap(), "ID - new \r\n\r\n## Usage\r\n");
    }

    #[test]
    fn failed_rewrite_leaves_document_untouched() {
        let mut doc = HexDocument::from_text("no markers");
        assert!(doc.rewrite("doc: ", "\nid: ", "x").is_err());
        assert_eq!(doc.to_text().unwrap(), "no markers");
    }
}
