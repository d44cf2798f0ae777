//! Keyword gate that decides whether extracted text is worth a model call.

/// Keywords whose presence marks a document as an invoice.
pub const INVOICE_KEYWORDS: [&str; 8] = [
    "invoice",
    "bill",
    "amount due",
    "due date",
    "billing address",
    "tax",
    "total",
    "payment terms",
];

/// Check whether extracted text looks like an invoice.
///
/// Case-insensitive substring search; true on the first match, false when
/// nothing matches (including empty text).
pub fn is_invoice(text: &str) -> bool {
    let lower = text.to_lowercase();
    INVOICE_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Cap text for the raw-text fallback preview at `limit` characters.
///
/// The marker is only appended when the text was actually cut.
pub fn truncate_preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detects_invoice_keywords() {
        assert!(is_invoice("Invoice #123, Amount Due: $50"));
        assert!(is_invoice("PAYMENT TERMS: Net 30"));
        assert!(is_invoice("please see the attached bill"));
        assert!(is_invoice("Billing Address:\n1 Main St"));
    }

    #[test]
    fn test_rejects_non_invoice_text() {
        assert!(!is_invoice("Lorem ipsum dolor sit amet"));
        assert!(!is_invoice(""));
    }

    #[test]
    fn test_keyword_inside_larger_word_still_matches() {
        // Substring semantics: "billing" contains "bill".
        assert!(is_invoice("billing inquiries only"));
    }

    #[test]
    fn test_preview_unchanged_when_short() {
        assert_eq!(truncate_preview("short text", 2000), "short text");
    }

    #[test]
    fn test_preview_truncates_with_marker() {
        let text = "a".repeat(2500);
        let preview = truncate_preview(&text, 2000);
        assert_eq!(preview.len(), 2000 + "... (truncated)".len());
        assert!(preview.ends_with("... (truncated)"));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(10);
        let preview = truncate_preview(&text, 5);
        assert_eq!(preview, format!("{}... (truncated)", "é".repeat(5)));
    }
}
