//! Tabular flattening and CSV export.
//!
//! Flattening turns nested invoice+line-item data into one-row-per-item
//! form. The result of a batch is an in-memory [`ExportBundle`] that the
//! caller writes into a fresh session directory; no shared export folder is
//! cleared or overwritten.

use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ExportError;
use crate::models::invoice::{Extraction, InvoiceRecord, Scalar};

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Column order of every exported CSV.
pub const CSV_HEADER: [&str; 8] = [
    "Invoice Number",
    "User Name",
    "Due Date",
    "Item Name",
    "Quantity",
    "Price",
    "Total",
    "Invoice Total Amount",
];

/// Name of the combined CSV covering the whole batch.
pub const COMBINED_FILE_NAME: &str = "all_invoices.csv";

/// One CSV row: invoice-level fields repeated per line item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    pub invoice_number: String,
    pub user_name: String,
    pub due_date: String,
    pub item_name: String,
    pub quantity: String,
    pub price: String,
    pub total: String,
    pub total_amount: String,
}

impl FlatRow {
    fn fields(&self) -> [&str; 8] {
        [
            &self.invoice_number,
            &self.user_name,
            &self.due_date,
            &self.item_name,
            &self.quantity,
            &self.price,
            &self.total,
            &self.total_amount,
        ]
    }
}

/// Flatten records into CSV rows.
///
/// Unclassified records contribute no rows. A record with N line items
/// yields N rows; a record without items yields exactly one row with blank
/// item fields. Row order follows input order, item order follows source
/// order; nothing is sorted, deduplicated, or re-validated.
pub fn flatten(records: &[Extraction]) -> Vec<FlatRow> {
    records
        .iter()
        .filter_map(Extraction::as_invoice)
        .flat_map(rows_for)
        .collect()
}

fn cell(value: &Option<Scalar>) -> String {
    value.as_ref().map(Scalar::as_cell).unwrap_or_default()
}

fn rows_for(record: &InvoiceRecord) -> Vec<FlatRow> {
    let base = FlatRow {
        invoice_number: cell(&record.invoice_number),
        user_name: cell(&record.user_name),
        due_date: cell(&record.due_date),
        total_amount: cell(&record.total_amount),
        ..Default::default()
    };

    if record.line_items.is_empty() {
        return vec![base];
    }

    record
        .line_items
        .iter()
        .map(|item| FlatRow {
            item_name: cell(&item.name),
            quantity: cell(&item.quantity),
            price: cell(&item.price),
            total: cell(&item.total),
            ..base.clone()
        })
        .collect()
}

lazy_static! {
    static ref UNSAFE_STEM: Regex = Regex::new(r"[^A-Za-z0-9_-]").unwrap();
}

/// Replace every character outside `[A-Za-z0-9_-]` with an underscore.
pub fn sanitize_file_stem(name: &str) -> String {
    UNSAFE_STEM.replace_all(name, "_").into_owned()
}

/// Derive the per-record file stem. `position` is 1-based and used for the
/// placeholder when no invoice number is available.
pub fn file_stem_for(record: &Extraction, position: usize) -> String {
    match record {
        Extraction::Invoice(invoice) => match &invoice.invoice_number {
            Some(number) if number.is_filled() => sanitize_file_stem(&number.as_cell()),
            _ => format!("Invoice_{position}"),
        },
        Extraction::Unclassified { .. } => format!("Invoice_{position}_raw"),
    }
}

/// A CSV file ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedCsv {
    pub file_name: String,
    pub contents: String,
}

/// The in-memory result of flattening a batch: the combined CSV plus one
/// CSV per record, in input order.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub combined: NamedCsv,
    pub per_invoice: Vec<NamedCsv>,
}

/// Build the export bundle for a batch of records.
///
/// Per-record file names collide when two invoices sanitize to the same
/// stem; later ones get a numeric suffix so every file in the bundle is
/// unique.
pub fn build_bundle(records: &[Extraction]) -> Result<ExportBundle> {
    let combined = NamedCsv {
        file_name: COMBINED_FILE_NAME.to_string(),
        contents: write_rows(&flatten(records))?,
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut per_invoice = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        let stem = file_stem_for(record, idx + 1);
        let count = seen.entry(stem.clone()).or_insert(0);
        *count += 1;
        let file_name = if *count == 1 {
            format!("{stem}.csv")
        } else {
            format!("{stem}_{count}.csv")
        };

        per_invoice.push(NamedCsv {
            file_name,
            contents: write_rows(&flatten(std::slice::from_ref(record)))?,
        });
    }

    Ok(ExportBundle {
        combined,
        per_invoice,
    })
}

fn write_rows(rows: &[FlatRow]) -> Result<String> {
    let mut buf = Vec::new();
    {
        let mut wtr = csv::Writer::from_writer(&mut buf);
        wtr.write_record(CSV_HEADER)?;
        for row in rows {
            wtr.write_record(row.fields())?;
        }
        wtr.flush()?;
    }
    Ok(String::from_utf8(buf)?)
}

impl ExportBundle {
    /// Write the bundle into a fresh session directory under `base_dir` and
    /// return that directory. Existing files are never deleted; a stamp
    /// collision (two batches within the same second) gets a suffix.
    pub fn write_to(&self, base_dir: &Path, per_invoice: bool) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let mut session_dir = base_dir.join(format!("session_{stamp}"));
        let mut attempt = 1;
        while session_dir.exists() {
            attempt += 1;
            session_dir = base_dir.join(format!("session_{stamp}_{attempt}"));
        }
        std::fs::create_dir_all(&session_dir)?;

        std::fs::write(
            session_dir.join(&self.combined.file_name),
            &self.combined.contents,
        )?;

        let mut written = 1;
        if per_invoice {
            for file in &self.per_invoice {
                std::fs::write(session_dir.join(&file.file_name), &file.contents)?;
                written += 1;
            }
        }

        debug!(dir = %session_dir.display(), files = written, "Wrote export bundle");
        Ok(session_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invoice::LineItem;
    use pretty_assertions::assert_eq;

    fn record_with_items(number: &str, items: usize) -> Extraction {
        Extraction::Invoice(InvoiceRecord {
            invoice_number: Some(Scalar::from(number)),
            user_name: Some(Scalar::from("Ada")),
            due_date: Some(Scalar::from("2025-01-31")),
            total_amount: Some(Scalar::from(100)),
            line_items: (0..items)
                .map(|i| LineItem {
                    name: Some(Scalar::from(format!("item-{i}").as_str())),
                    quantity: Some(Scalar::from(1)),
                    price: Some(Scalar::from(5)),
                    total: Some(Scalar::from(5)),
                })
                .collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_flatten_one_row_per_item() {
        let rows = flatten(&[record_with_items("INV-1", 3)]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].invoice_number, "INV-1");
        assert_eq!(rows[0].item_name, "item-0");
        assert_eq!(rows[2].item_name, "item-2");
        // Invoice-level fields repeat on every row.
        assert!(rows.iter().all(|r| r.total_amount == "100"));
    }

    #[test]
    fn test_flatten_itemless_record_gets_blank_item_row() {
        let rows = flatten(&[record_with_items("INV-2", 0)]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].invoice_number, "INV-2");
        assert_eq!(rows[0].item_name, "");
        assert_eq!(rows[0].quantity, "");
    }

    #[test]
    fn test_flatten_skips_unclassified() {
        let records = vec![
            record_with_items("INV-1", 2),
            Extraction::Unclassified {
                raw_text: "nope".to_string(),
            },
            record_with_items("INV-3", 0),
        ];
        let rows = flatten(&records);
        // 2 + 0 + 1, in input order.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].invoice_number, "INV-1");
        assert_eq!(rows[2].invoice_number, "INV-3");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("INV/001#"), "INV_001_");
        assert_eq!(sanitize_file_stem("plain-Name_9"), "plain-Name_9");
        assert_eq!(sanitize_file_stem("a b.c"), "a_b_c");
    }

    #[test]
    fn test_file_stem_placeholders() {
        let unnumbered = Extraction::Invoice(InvoiceRecord::default());
        assert_eq!(file_stem_for(&unnumbered, 2), "Invoice_2");

        let raw = Extraction::Unclassified {
            raw_text: String::new(),
        };
        assert_eq!(file_stem_for(&raw, 3), "Invoice_3_raw");

        assert_eq!(file_stem_for(&record_with_items("INV/7", 0), 1), "INV_7");
    }

    #[test]
    fn test_bundle_combined_matches_per_record_sum() {
        let records = vec![
            record_with_items("INV-1", 2),
            Extraction::Unclassified {
                raw_text: "nope".to_string(),
            },
            record_with_items("INV-2", 0),
        ];
        let bundle = build_bundle(&records).unwrap();

        // Header + 3 data rows.
        assert_eq!(bundle.combined.contents.lines().count(), 4);
        assert!(bundle.combined.contents.starts_with("Invoice Number,"));

        // One file per record; the fallback's file is header-only.
        assert_eq!(bundle.per_invoice.len(), 3);
        assert_eq!(bundle.per_invoice[0].file_name, "INV-1.csv");
        assert_eq!(bundle.per_invoice[1].file_name, "Invoice_2_raw.csv");
        assert_eq!(bundle.per_invoice[1].contents.lines().count(), 1);
        assert_eq!(bundle.per_invoice[2].file_name, "INV-2.csv");
    }

    #[test]
    fn test_bundle_suffixes_colliding_stems() {
        let records = vec![record_with_items("INV-1", 1), record_with_items("INV/1", 1)];
        let bundle = build_bundle(&records).unwrap();
        // "INV/1" sanitizes to "INV_1", which does not collide with "INV-1".
        assert_eq!(bundle.per_invoice[0].file_name, "INV-1.csv");
        assert_eq!(bundle.per_invoice[1].file_name, "INV_1.csv");

        let colliding = build_bundle(&[record_with_items("A", 1), record_with_items("A", 1)])
            .unwrap();
        assert_eq!(colliding.per_invoice[0].file_name, "A.csv");
        assert_eq!(colliding.per_invoice[1].file_name, "A_2.csv");
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let record = Extraction::Invoice(InvoiceRecord {
            invoice_number: Some(Scalar::from("INV-1")),
            user_name: Some(Scalar::from("Doe, \"Jane\"")),
            ..Default::default()
        });
        let bundle = build_bundle(&[record]).unwrap();
        assert!(bundle.combined.contents.contains("\"Doe, \"\"Jane\"\"\""));
    }

    #[test]
    fn test_write_to_creates_session_dir_without_clobbering() {
        let tmp = tempfile::tempdir().unwrap();
        let pre_existing = tmp.path().join("keep.csv");
        std::fs::write(&pre_existing, "old data").unwrap();

        let bundle = build_bundle(&[record_with_items("INV-1", 1)]).unwrap();
        let dir = bundle.write_to(tmp.path(), true).unwrap();

        assert!(dir.join(COMBINED_FILE_NAME).exists());
        assert!(dir.join("INV-1.csv").exists());
        // Pre-existing files outside the session dir are untouched.
        assert_eq!(std::fs::read_to_string(&pre_existing).unwrap(), "old data");

        // A second write lands in a different directory.
        let dir2 = bundle.write_to(tmp.path(), false).unwrap();
        assert_ne!(dir, dir2);
        assert!(!dir2.join("INV-1.csv").exists());
    }
}
