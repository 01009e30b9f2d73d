use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::TextCapabilityConfig;

use super::{check_status, create_http_client, CapabilityError, Credential, PromptRequest, Result, TextGenerator};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Text generation through the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Credential,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(config: &TextCapabilityConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config.timeout_secs)?,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: Credential::from_source("anthropic api key", &config.api_key),
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: &PromptRequest) -> Result<String> {
        let api_key = self.api_key.expose()?;

        debug!(
            "Requesting completion from {} (max_tokens={}, temperature={})",
            self.model, request.max_tokens, request.temperature
        );

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| CapabilityError::from_reqwest("Messages request failed", e))?;

        let response = check_status(response).await.inspect_err(|e| {
            warn!("Messages request rejected: {}", e);
        })?;

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::MalformedResponse(format!("Messages response: {}", e)))?;

        first_text_block(parsed)
    }
}

fn first_text_block(response: MessagesResponse) -> Result<String> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| CapabilityError::MalformedResponse("no text block in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_block_skips_other_blocks() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "thinking"}, {"type": "text", "text": "TITLE: Hello"}]}"#,
        )
        .unwrap();
        assert_eq!(first_text_block(response).unwrap(), "TITLE: Hello");
    }

    #[test]
    fn test_first_text_block_empty_is_malformed() {
        let response: MessagesResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert!(matches!(
            first_text_block(response),
            Err(CapabilityError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_request_serialization() {
        let body = MessagesRequest {
            model: "claude-sonnet-4-20250514",
            max_tokens: 4000,
            temperature: 0.3,
            messages: [Message {
                role: "user",
                content: "Plan a post",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["max_tokens"], 4000);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Plan a post");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let config = TextCapabilityConfig {
            base_url: "https://api.anthropic.com/".to_string(),
            ..TextCapabilityConfig::default()
        };
        let client = AnthropicClient::new(&config).unwrap();
        assert_eq!(client.endpoint, "https://api.anthropic.com/v1/messages");
    }
}
