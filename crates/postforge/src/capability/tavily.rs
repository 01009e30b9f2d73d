use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SearchCapabilityConfig;

use super::{
    check_status, create_http_client, CapabilityError, Credential, Result, SearchProvider,
    SearchQuery, SearchResult,
};

/// Web search through the Tavily search API.
pub struct TavilyClient {
    client: Client,
    endpoint: String,
    api_key: Credential,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    max_results: usize,
    #[serde(skip_serializing_if = "no_domains")]
    include_domains: &'a [String],
}

fn no_domains(domains: &&[String]) -> bool {
    domains.is_empty()
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl TavilyClient {
    pub fn new(config: &SearchCapabilityConfig) -> Result<Self> {
        Ok(Self {
            client: create_http_client(config.timeout_secs)?,
            endpoint: format!("{}/search", config.base_url.trim_end_matches('/')),
            api_key: Credential::from_source("tavily api key", &config.api_key),
        })
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let api_key = self.api_key.expose()?;

        debug!(
            "Searching for '{}' (max_results={}, domains={})",
            query.query,
            query.max_results,
            query.include_domains.len()
        );

        let body = SearchRequest {
            api_key,
            query: &query.query,
            search_depth: "advanced",
            max_results: query.max_results,
            include_domains: &query.include_domains,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| CapabilityError::from_reqwest("Search request failed", e))?;

        let response = check_status(response).await.inspect_err(|e| {
            warn!("Search for '{}' rejected: {}", query.query, e);
        })?;

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::MalformedResponse(format!("Search response: {}", e)))?;

        debug!("Search for '{}' returned {} results", query.query, parsed.results.len());
        Ok(parsed.results)
    }
}
