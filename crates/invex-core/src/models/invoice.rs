//! Invoice data models produced by the extraction pipeline.
//!
//! The wire shape mirrors what the model is asked to return: a flat map of
//! invoice-level fields plus a `Product Details` list. Field values are
//! carried exactly as extracted; no arithmetic re-validation is performed.

use serde::Serialize;
use std::fmt;

/// A scalar field value as returned by the model: text or a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Textual value.
    Text(String),
    /// Numeric value, kept in its JSON representation.
    Number(serde_json::Number),
}

impl Scalar {
    /// Render the value as a CSV cell.
    pub fn as_cell(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
        }
    }

    /// Whether the value carries displayable content. Blank strings and the
    /// model's "N/A" placeholder do not.
    pub fn is_filled(&self) -> bool {
        match self {
            Scalar::Text(s) => {
                let trimmed = s.trim();
                !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("n/a")
            }
            Scalar::Number(_) => true,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// One product/service entry within an invoice's itemized list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<Scalar>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Scalar>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Scalar>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Scalar>,
}

/// Structured fields extracted from one invoice document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvoiceRecord {
    #[serde(rename = "Invoice Number", skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<Scalar>,

    #[serde(rename = "User Name", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<Scalar>,

    #[serde(rename = "Billing Address", skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Scalar>,

    #[serde(rename = "Due Date", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Scalar>,

    #[serde(rename = "Payment Terms", skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<Scalar>,

    #[serde(rename = "Currency", skip_serializing_if = "Option::is_none")]
    pub currency: Option<Scalar>,

    #[serde(rename = "Tax Amount", skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Scalar>,

    #[serde(rename = "Total Amount", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Scalar>,

    /// Line items, in source order.
    #[serde(rename = "Product Details", skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItem>,
}

impl InvoiceRecord {
    /// How many of the scalar fields were extracted (out of the total).
    pub fn coverage(&self) -> (usize, usize) {
        let total = 8;
        let filled = [
            &self.invoice_number,
            &self.user_name,
            &self.billing_address,
            &self.due_date,
            &self.payment_terms,
            &self.currency,
            &self.tax_amount,
            &self.total_amount,
        ]
        .iter()
        .filter(|v| v.as_ref().is_some_and(Scalar::is_filled))
        .count();
        (filled, total)
    }
}

/// Result of processing one document: structured fields, or the raw-text
/// fallback when classification or response parsing could not produce them.
/// The two shapes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extraction {
    /// The fallback, holding the document's (possibly truncated) text.
    Unclassified { raw_text: String },
    /// A structured invoice record.
    Invoice(InvoiceRecord),
}

impl Extraction {
    /// The structured record, if this extraction produced one.
    pub fn as_invoice(&self) -> Option<&InvoiceRecord> {
        match self {
            Extraction::Invoice(record) => Some(record),
            Extraction::Unclassified { .. } => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, Extraction::Unclassified { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_cell_rendering() {
        assert_eq!(Scalar::from("INV-1").as_cell(), "INV-1");
        assert_eq!(Scalar::from(42).as_cell(), "42");

        let float = Scalar::Number(serde_json::Number::from_f64(9.99).unwrap());
        assert_eq!(float.as_cell(), "9.99");
    }

    #[test]
    fn test_scalar_filled() {
        assert!(Scalar::from("INV-1").is_filled());
        assert!(Scalar::from(0).is_filled());
        assert!(!Scalar::from("").is_filled());
        assert!(!Scalar::from("  ").is_filled());
        assert!(!Scalar::from("N/A").is_filled());
        assert!(!Scalar::from("n/a").is_filled());
    }

    #[test]
    fn test_record_serializes_with_wire_keys() {
        let record = InvoiceRecord {
            invoice_number: Some(Scalar::from("INV-1")),
            total_amount: Some(Scalar::from(100)),
            line_items: vec![LineItem {
                name: Some(Scalar::from("Widget")),
                quantity: Some(Scalar::from(2)),
                ..Default::default()
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Invoice Number"], "INV-1");
        assert_eq!(json["Total Amount"], 100);
        assert_eq!(json["Product Details"][0]["name"], "Widget");
        // Absent fields stay absent rather than serializing as null.
        assert!(json.get("Due Date").is_none());
    }

    #[test]
    fn test_fallback_serializes_as_raw_text_map() {
        let fallback = Extraction::Unclassified {
            raw_text: "not an invoice".to_string(),
        };
        let json = serde_json::to_value(&fallback).unwrap();
        assert_eq!(json, serde_json::json!({ "raw_text": "not an invoice" }));
    }

    #[test]
    fn test_coverage_counts_filled_fields() {
        let record = InvoiceRecord {
            invoice_number: Some(Scalar::from("INV-1")),
            currency: Some(Scalar::from("USD")),
            tax_amount: Some(Scalar::from("N/A")),
            ..Default::default()
        };
        assert_eq!(record.coverage(), (2, 8));
    }
}
