//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// LLM extraction error.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// CSV export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to the hosted LLM call.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The API key environment variable is not set.
    #[error("API key not set: export {0} before calling the model")]
    MissingApiKey(&'static str),

    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered 200 but carried no choices.
    #[error("empty response from LLM")]
    EmptyResponse,
}

/// Errors related to CSV export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure while writing the bundle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV writer produced non-UTF-8 output.
    #[error("invalid UTF-8 in CSV buffer: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
