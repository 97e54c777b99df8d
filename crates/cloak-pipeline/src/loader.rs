//! PDF document loader

use async_trait::async_trait;
use cloak_core::provider::DocumentLoader;
use cloak_core::{Error, Result};
use tracing::debug;

/// Mime type handled by [`PdfDocumentLoader`]
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Extracts plain text from PDF documents.
///
/// Any other mime type yields an empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfDocumentLoader;

impl PdfDocumentLoader {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentLoader for PdfDocumentLoader {
    async fn load(&self, bytes: &[u8], mime_type: &str) -> Result<String> {
        if mime_type != PDF_MIME_TYPE {
            debug!(mime_type, "Skipping unsupported document type");
            return Ok(String::new());
        }

        // Text extraction is CPU bound
        let bytes = bytes.to_vec();
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| Error::Extraction(format!("PDF extraction task failed: {}", e)))?
            .map_err(|e| Error::Extraction(format!("Failed to read PDF: {}", e)))?;

        debug!(chars = text.chars().count(), "Extracted PDF text");
        Ok(text)
    }
}
