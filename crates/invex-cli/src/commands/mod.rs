//! CLI subcommands and the shared per-document pipeline.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::Path;

use invex_core::error::LlmError;
use invex_core::extract::{extract_fields, is_invoice, normalize, truncate_preview};
use invex_core::models::config::InvexConfig;
use invex_core::models::invoice::Extraction;
use invex_core::pdf::{PdfExtractor, PdfSource};

/// Load configuration from an explicit path, or fall back to defaults.
pub(crate) fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    match config_path {
        Some(path) => Ok(InvexConfig::from_file(Path::new(path))?),
        None => Ok(InvexConfig::default()),
    }
}

/// Read a PDF from disk and extract its text.
pub(crate) fn read_pdf_text(path: &Path) -> anyhow::Result<String> {
    let data = fs::read(path)?;
    let mut extractor = PdfExtractor::new();
    extractor.load(&data)?;
    let text = extractor.extract_text()?;
    Ok(text)
}

/// The raw-text fallback for a document, with the preview cap applied.
pub(crate) fn raw_fallback(config: &InvexConfig, text: &str) -> Extraction {
    Extraction::Unclassified {
        raw_text: truncate_preview(text, config.extraction.preview_chars),
    }
}

/// Run the classify → model call → normalize pipeline over extracted text.
///
/// Documents that fail the keyword gate never reach the model; they come
/// back as the raw-text fallback directly.
pub(crate) async fn extract_document(
    client: &reqwest::Client,
    config: &InvexConfig,
    text: &str,
) -> Result<Extraction, LlmError> {
    if !is_invoice(text) {
        return Ok(raw_fallback(config, text));
    }

    let response = extract_fields(client, &config.llm, text).await?;
    Ok(normalize(&response))
}
