//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::debug;

use super::{PdfSource, Result};
use crate::error::PdfError;

/// PDF text extractor.
///
/// lopdf handles structure (page count, encryption); pdf-extract does the
/// actual text extraction from the raw bytes.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfSource for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // Re-save so pdf-extract sees plaintext bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(extractor.load(b"not a pdf").is_err());
    }

    #[test]
    fn test_extract_without_load_fails() {
        let extractor = PdfExtractor::new();
        assert!(extractor.extract_text().is_err());
    }
}
