use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
pub use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_queue_directory")]
    pub queue_directory: String,
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
    pub sites: BTreeMap<String, SiteConfig>,
}

fn default_queue_directory() -> String {
    "content".to_string()
}

impl Config {
    /// Looks up a site by its key in the `sites` map.
    pub fn site(&self, key: &str) -> Result<&SiteConfig, ConfigError> {
        self.sites.get(key).ok_or_else(|| ConfigError::UnknownSite {
            name: key.to_string(),
            available: self.sites.keys().cloned().collect::<Vec<_>>().join(", "),
        })
    }
}

// ============================================
// Sites
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Display name, used in prompts.
    pub name: String,
    pub domain: String,
    pub author: String,
    pub destination: Destination,
    pub output_directory: String,
    #[serde(default = "default_images_directory")]
    pub images_directory: String,
    /// Public URL prefix under which generated images are served.
    #[serde(default = "default_images_url_prefix")]
    pub images_url_prefix: String,
    #[serde(default = "default_word_count")]
    pub default_word_count: u32,
    #[serde(default = "default_image_count")]
    pub default_image_count: u32,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default = "default_reading_level")]
    pub reading_level: String,
    #[serde(default = "default_target_country")]
    pub target_country: String,
    #[serde(default = "default_target_language")]
    pub target_language: String,
    #[serde(default = "default_tags")]
    pub default_tags: Vec<String>,
    #[serde(default = "default_content_focus")]
    pub content_focus: String,
    #[serde(default = "default_target_audience")]
    pub target_audience: String,
    #[serde(default)]
    pub research: ResearchConfig,
}

fn default_images_directory() -> String {
    "public/images".to_string()
}

fn default_images_url_prefix() -> String {
    "/images".to_string()
}

fn default_word_count() -> u32 {
    1500
}

fn default_image_count() -> u32 {
    3
}

fn default_reading_level() -> String {
    "general".to_string()
}

fn default_target_country() -> String {
    "AU".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_tags() -> Vec<String> {
    vec!["AI".to_string(), "Technology".to_string()]
}

fn default_content_focus() -> String {
    "Technology and AI thought leadership, exploring developments and industry trends".to_string()
}

fn default_target_audience() -> String {
    "Professionals and business leaders interested in technology".to_string()
}

/// Output destination for a site. Exactly one per site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum Destination {
    /// Front-matter tagged document written to the output directory.
    Mdx,
    /// Draft post submitted to a Ghost Admin API.
    Ghost(GhostSettings),
    /// Raw markdown body written to the output directory.
    Markdown,
}

impl Destination {
    pub fn kind(&self) -> DestinationKind {
        match self {
            Destination::Mdx => DestinationKind::Mdx,
            Destination::Ghost(_) => DestinationKind::Ghost,
            Destination::Markdown => DestinationKind::Markdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Mdx,
    Ghost,
    Markdown,
}

impl std::fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestinationKind::Mdx => write!(f, "mdx"),
            DestinationKind::Ghost => write!(f, "ghost"),
            DestinationKind::Markdown => write!(f, "markdown"),
        }
    }
}

/// Ghost Admin API credentials. Both are resolved at publish time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GhostSettings {
    #[serde(default)]
    pub api_url: SecretSource,
    /// Admin API key in `id:secret` form.
    #[serde(default)]
    pub admin_key: SecretSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Technical,
    Educational,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Professional => write!(f, "professional"),
            Tone::Casual => write!(f, "casual"),
            Tone::Technical => write!(f, "technical"),
            Tone::Educational => write!(f, "educational"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Query templates; `{topic}` and `{year}` are substituted.
    #[serde(default = "default_query_templates")]
    pub query_templates: Vec<String>,
    #[serde(default = "default_max_queries")]
    pub max_queries: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_include_domains")]
    pub include_domains: Vec<String>,
    /// URL substrings that mark a result as an academic source.
    #[serde(default = "default_academic_markers")]
    pub academic_markers: Vec<String>,
}

fn default_query_templates() -> Vec<String> {
    vec![
        "{topic} latest developments {year}".to_string(),
        "{topic} research findings".to_string(),
        "{topic} best practices".to_string(),
        "{topic} industry trends".to_string(),
        "{topic} future predictions".to_string(),
    ]
}

fn default_max_queries() -> usize {
    4
}

fn default_max_results() -> usize {
    3
}

fn default_include_domains() -> Vec<String> {
    [
        "arxiv.org",
        "nature.com",
        "sciencedirect.com",
        "springer.com",
        "ieee.org",
        "acm.org",
        "medium.com",
        "techcrunch.com",
        "wired.com",
        "forbes.com",
        "hbr.org",
        "mckinsey.com",
        "gartner.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_academic_markers() -> Vec<String> {
    ["arxiv", "nature.com", "sciencedirect", "springer", "ieee", "acm"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            query_templates: default_query_templates(),
            max_queries: default_max_queries(),
            max_results: default_max_results(),
            include_domains: default_include_domains(),
            academic_markers: default_academic_markers(),
        }
    }
}

// ============================================
// Capabilities
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitiesConfig {
    #[serde(default)]
    pub text: TextCapabilityConfig,
    #[serde(default)]
    pub search: SearchCapabilityConfig,
    #[serde(default)]
    pub images: ImageCapabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextCapabilityConfig {
    #[serde(default = "default_anthropic_key")]
    pub api_key: SecretSource,
    #[serde(default = "default_text_model")]
    pub model: String,
    #[serde(default = "default_anthropic_url")]
    pub base_url: String,
    #[serde(default = "default_text_timeout")]
    pub timeout_secs: u64,
}

fn default_anthropic_key() -> SecretSource {
    SecretSource::env("ANTHROPIC_API_KEY")
}

fn default_text_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_anthropic_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_text_timeout() -> u64 {
    300
}

impl Default for TextCapabilityConfig {
    fn default() -> Self {
        Self {
            api_key: default_anthropic_key(),
            model: default_text_model(),
            base_url: default_anthropic_url(),
            timeout_secs: default_text_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCapabilityConfig {
    #[serde(default = "default_tavily_key")]
    pub api_key: SecretSource,
    #[serde(default = "default_tavily_url")]
    pub base_url: String,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

fn default_tavily_key() -> SecretSource {
    SecretSource::env("TAVILY_API_KEY")
}

fn default_tavily_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_search_timeout() -> u64 {
    60
}

impl Default for SearchCapabilityConfig {
    fn default() -> Self {
        Self {
            api_key: default_tavily_key(),
            base_url: default_tavily_url(),
            timeout_secs: default_search_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageCapabilityConfig {
    #[serde(default = "default_google_project")]
    pub project_id: SecretSource,
    #[serde(default = "default_google_location")]
    pub location: String,
    #[serde(default = "default_image_model")]
    pub model: String,
    /// OAuth access token for Vertex AI.
    #[serde(default = "default_google_token")]
    pub access_token: SecretSource,
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: u64,
}

fn default_google_project() -> SecretSource {
    SecretSource::env("GOOGLE_PROJECT_ID")
}

fn default_google_location() -> String {
    "us-central1".to_string()
}

fn default_image_model() -> String {
    "imagen-3.0-generate-002".to_string()
}

fn default_google_token() -> SecretSource {
    SecretSource::env("GOOGLE_ACCESS_TOKEN")
}

fn default_image_timeout() -> u64 {
    120
}

impl Default for ImageCapabilityConfig {
    fn default() -> Self {
        Self {
            project_id: default_google_project(),
            location: default_google_location(),
            model: default_image_model(),
            access_token: default_google_token(),
            timeout_secs: default_image_timeout(),
        }
    }
}
