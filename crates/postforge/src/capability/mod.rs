//! Narrow ports onto the hosted services the stages consume.
//!
//! Each port is a single-method async trait. Production binds them to the
//! HTTP clients in this module; tests bind them to canned fakes.

pub mod anthropic;
pub mod error;
pub mod imagen;
pub mod tavily;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{CapabilitiesConfig, SecretSource};
use crate::sanitize;

pub use anthropic::AnthropicClient;
pub use error::{CapabilityError, Result};
pub use imagen::ImagenClient;
pub use tavily::TavilyClient;

#[derive(Debug, Clone, PartialEq)]
pub struct PromptRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub query: String,
    pub max_results: usize,
    pub include_domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &PromptRequest) -> Result<String>;
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns raw image bytes, or [`CapabilityError::Refused`] when the
    /// service declines the prompt.
    async fn generate_image(&self, prompt: &str, aspect_ratio: &str) -> Result<Vec<u8>>;
}

/// The three ports a pipeline run needs.
#[derive(Clone)]
pub struct Capabilities {
    pub text: Arc<dyn TextGenerator>,
    pub search: Arc<dyn SearchProvider>,
    pub images: Arc<dyn ImageGenerator>,
}

impl Capabilities {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            text,
            search,
            images,
        }
    }

    /// Builds the production HTTP clients. Missing credentials do not fail
    /// here; the affected client reports `NotConfigured` when first called.
    pub fn from_config(config: &CapabilitiesConfig) -> Result<Self> {
        Ok(Self {
            text: Arc::new(AnthropicClient::new(&config.text)?),
            search: Arc::new(TavilyClient::new(&config.search)?),
            images: Arc::new(ImagenClient::new(&config.images)?),
        })
    }
}

/// A credential resolved once at client construction.
pub(crate) enum Credential {
    Resolved(SecretString),
    Missing(String),
}

impl Credential {
    pub(crate) fn from_source(label: &str, source: &SecretSource) -> Self {
        match source.resolve() {
            Ok(secret) => Credential::Resolved(secret),
            Err(e) => {
                log::debug!("{} credential unavailable: {}", label, e);
                Credential::Missing(format!("{}: {}", label, e))
            }
        }
    }

    pub(crate) fn expose(&self) -> Result<&str> {
        match self {
            Credential::Resolved(secret) => Ok(secret.expose_secret()),
            Credential::Missing(reason) => Err(CapabilityError::NotConfigured(reason.clone())),
        }
    }
}

/// Maximum upstream error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 300;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn create_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CapabilityError::Transport(format!("Failed to create HTTP client: {}", e)))
}

/// Maps 429 to a quota error and any other non-2xx status to `Http`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = sanitize::truncate_for_log(body.trim(), MAX_ERROR_BODY_CHARS);

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(CapabilityError::Quota(message));
    }

    Err(CapabilityError::Http {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_resolved() {
        let credential = Credential::from_source("test", &SecretSource::direct("sk-123"));
        assert_eq!(credential.expose().unwrap(), "sk-123");
    }

    #[test]
    fn test_credential_missing_reports_not_configured() {
        let credential = Credential::from_source("search", &SecretSource::default());
        let err = credential.expose().unwrap_err();
        assert!(matches!(err, CapabilityError::NotConfigured(_)));
        assert!(err.to_string().contains("search"));
    }

    #[test]
    fn test_from_config_without_credentials_succeeds() {
        let mut config = CapabilitiesConfig::default();
        config.text.api_key = SecretSource::default();
        config.search.api_key = SecretSource::default();
        config.images.access_token = SecretSource::default();
        config.images.project_id = SecretSource::default();

        assert!(Capabilities::from_config(&config).is_ok());
    }

    #[test]
    fn test_prompt_request_new() {
        let request = PromptRequest::new("Write", 500, 0.3);
        assert_eq!(request.prompt, "Write");
        assert_eq!(request.max_tokens, 500);
    }
}
