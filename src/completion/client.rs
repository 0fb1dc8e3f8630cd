use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use std::time::Duration;

use super::protocol::{CompletionOptions, CompletionRequest, PromptMessage, extract_reply};
use crate::config::CompletionConfig;
use crate::error::CompletionError;

/// Single-turn client for the completion endpoint. No retries.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn build_request(&self, user_text: &str) -> CompletionRequest {
        CompletionRequest {
            model_uri: self.config.model_uri.clone(),
            completion_options: CompletionOptions {
                stream: false,
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens.to_string(),
            },
            messages: vec![PromptMessage {
                role: "user".to_string(),
                text: user_text.to_string(),
            }],
        }
    }

    /// Sends `user_text` as a single user turn and returns the first alternative.
    pub async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
        let request = self.build_request(user_text);

        let response = self
            .client
            .post(&self.config.endpoint)
            .header(AUTHORIZATION, format!("Api-Key {}", self.config.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompletionError::Http {
                code: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.text().await?;
        log::debug!("Completion response body: {body}");
        extract_reply(&body)
    }
}
