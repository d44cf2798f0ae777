//! Hosted-model client for structured field extraction.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::models::config::LlmConfig;

/// Environment variable holding the API key. Read at call time, not startup.
pub const API_KEY_ENV: &str = "INVEX_API_KEY";

/// The prompt that instructs the model to return invoice fields as bare JSON.
const SYSTEM_PROMPT: &str = r#"You are an invoice data extraction assistant.
Given raw text extracted from a PDF invoice, extract the following fields:

- Invoice Number
- User Name
- Billing Address
- Due Date
- Payment Terms
- Currency
- Tax Amount
- Product Details (list of objects with name, quantity, price, total)
- Total Amount

Use null for fields you cannot determine.
Output ONLY valid JSON. No explanations, no notes, no markdown fences."#;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Cut text at a char boundary to stay within the model's context budget.
fn clamp_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn build_request(llm: &LlmConfig, text: &str) -> ChatRequest {
    ChatRequest {
        model: llm.model.clone(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: format!("Invoice Text:\n{text}"),
            },
        ],
        temperature: llm.temperature,
    }
}

/// Ask the hosted model to extract structured fields from invoice text.
///
/// Returns the raw response content; the normalizer is responsible for
/// turning it into a record. No retry is attempted.
pub async fn extract_fields(
    client: &Client,
    llm: &LlmConfig,
    text: &str,
) -> Result<String, LlmError> {
    let api_key =
        std::env::var(API_KEY_ENV).map_err(|_| LlmError::MissingApiKey(API_KEY_ENV))?;

    let text = clamp_chars(text, llm.max_prompt_chars);
    let request = build_request(llm, text);

    let url = format!("{}/chat/completions", llm.base_url.trim_end_matches('/'));
    debug!(model = %llm.model, url = %url, chars = text.len(), "Requesting field extraction");

    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .timeout(std::time::Duration::from_secs(llm.timeout_secs))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Api { status, body });
    }

    let chat_response: ChatResponse = response.json().await?;
    chat_response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(LlmError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clamp_chars_short_text_untouched() {
        assert_eq!(clamp_chars("hello", 10), "hello");
    }

    #[test]
    fn test_clamp_chars_cuts_on_char_boundary() {
        let text = "déjà vu";
        assert_eq!(clamp_chars(text, 4), "déjà");
    }

    #[test]
    fn test_request_shape() {
        let llm = LlmConfig::default();
        let request = build_request(&llm, "Invoice #1");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        let user = json["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Invoice #1"));
    }

    #[test]
    fn test_prompt_requests_bare_json() {
        assert!(SYSTEM_PROMPT.contains("ONLY valid JSON"));
        assert!(SYSTEM_PROMPT.contains("Product Details"));
    }
}
