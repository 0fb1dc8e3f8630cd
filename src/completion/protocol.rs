//! Wire types of the foundation-models completion endpoint.

use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model_uri: String,
    pub completion_options: CompletionOptions,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOptions {
    pub stream: bool,
    pub temperature: f64,
    /// The endpoint takes int64 fields as JSON strings.
    pub max_tokens: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub text: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    result: CompletionResult,
}

#[derive(Deserialize)]
struct CompletionResult {
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    message: AlternativeMessage,
}

#[derive(Deserialize)]
struct AlternativeMessage {
    text: String,
}

/// Pulls `result.alternatives[0].message.text` out of a response body.
pub fn extract_reply(body: &str) -> Result<String, CompletionError> {
    let response: CompletionResponse = serde_json::from_str(body)?;
    response
        .result
        .alternatives
        .into_iter()
        .next()
        .map(|alternative| alternative.message.text)
        .ok_or_else(|| CompletionError::Parse("response has no alternatives".to_string()))
}
