//! Response normalization: turn a raw model response into a reliable record.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::invoice::{Extraction, InvoiceRecord, LineItem, Scalar};

lazy_static! {
    // Fence markers the model sometimes adds despite instructions.
    static ref FENCE: Regex = Regex::new(r"(?i)```json|```").unwrap();
}

/// Normalize a raw model response into an extraction result.
///
/// Strips markdown fences, carves out the first-`{`-to-last-`}` candidate,
/// and parses it strictly. Never fails: anything that does not parse into a
/// JSON object comes back as the raw-text fallback holding the original,
/// unstripped input.
pub fn normalize(response: &str) -> Extraction {
    let stripped = FENCE.replace_all(response, "");
    let stripped = stripped.trim();

    // Greedy: with multiple brace blocks this over-captures, and the strict
    // parse below then falls through to the fallback.
    let candidate = match (stripped.find('{'), stripped.rfind('}')) {
        (Some(start), Some(end)) if start < end => &stripped[start..=end],
        _ => stripped,
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Extraction::Invoice(record_from_map(&map)),
        _ => Extraction::Unclassified {
            raw_text: response.to_string(),
        },
    }
}

/// Lenient map-to-record coercion: strings and numbers are accepted for
/// every field, anything else is dropped, and a non-array `Product Details`
/// value counts as no items.
fn record_from_map(map: &serde_json::Map<String, Value>) -> InvoiceRecord {
    let line_items = match map.get("Product Details") {
        Some(Value::Array(items)) => items.iter().filter_map(item_from_value).collect(),
        _ => Vec::new(),
    };

    InvoiceRecord {
        invoice_number: scalar(map.get("Invoice Number")),
        user_name: scalar(map.get("User Name")),
        billing_address: scalar(map.get("Billing Address")),
        due_date: scalar(map.get("Due Date")),
        payment_terms: scalar(map.get("Payment Terms")),
        currency: scalar(map.get("Currency")),
        tax_amount: scalar(map.get("Tax Amount")),
        total_amount: scalar(map.get("Total Amount")),
        line_items,
    }
}

fn item_from_value(value: &Value) -> Option<LineItem> {
    let map = value.as_object()?;
    Some(LineItem {
        name: scalar(map.get("name")),
        quantity: scalar(map.get("quantity")),
        price: scalar(map.get("price")),
        total: scalar(map.get("total")),
    })
}

fn scalar(value: Option<&Value>) -> Option<Scalar> {
    match value? {
        Value::String(s) => Some(Scalar::Text(s.clone())),
        Value::Number(n) => Some(Scalar::Number(n.clone())),
        _ => None,
    }
}
