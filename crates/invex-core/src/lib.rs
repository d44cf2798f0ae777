//! Core library for LLM-based invoice data extraction.
//!
//! This crate provides:
//! - PDF text extraction (lopdf + pdf-extract)
//! - Invoice classification via a keyword gate
//! - Hosted-model field extraction and response normalization
//! - Tabular flattening and CSV export bundles

pub mod error;
pub mod export;
pub mod extract;
pub mod models;
pub mod pdf;

pub use error::{ExportError, InvexError, LlmError, PdfError, Result};
pub use export::{ExportBundle, FlatRow, NamedCsv, build_bundle, flatten};
pub use extract::{extract_fields, is_invoice, normalize, truncate_preview};
pub use models::config::InvexConfig;
pub use models::invoice::{Extraction, InvoiceRecord, LineItem, Scalar};
pub use pdf::{PdfExtractor, PdfSource};
