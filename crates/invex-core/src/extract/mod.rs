//! Invoice field extraction: keyword gate, hosted-model call, and response
//! normalization.

mod classify;
mod client;
mod normalize;

pub use classify::{INVOICE_KEYWORDS, is_invoice, truncate_preview};
pub use client::{API_KEY_ENV, extract_fields};
pub use normalize::normalize;
