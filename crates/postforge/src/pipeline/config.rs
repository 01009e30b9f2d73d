use crate::config::{Config, SiteConfig};
use crate::error::ConfigError;

use super::state::GenerationRequest;

/// Site settings a run works against.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub site_key: String,
    pub site: SiteConfig,
}

impl PipelineConfig {
    pub fn from_config(config: &Config, site_key: &str) -> Result<Self, ConfigError> {
        let site = config.site(site_key)?;
        Ok(Self::for_site(site_key, site.clone()))
    }

    pub fn for_site(site_key: impl Into<String>, site: SiteConfig) -> Self {
        Self {
            site_key: site_key.into(),
            site,
        }
    }
}

/// Per-run values that replace the site defaults when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOverrides {
    pub keyword: Option<String>,
    pub word_count: Option<u32>,
    pub image_count: Option<u32>,
    pub tags: Option<Vec<String>>,
}

impl RunOverrides {
    /// Builds the run's input record; an empty tag list counts as absent.
    pub fn resolve(&self, topic: &str, site: &SiteConfig) -> GenerationRequest {
        let tags = self
            .tags
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| site.default_tags.clone());

        GenerationRequest {
            topic: topic.trim().to_string(),
            primary_keyword: self.keyword.clone().filter(|k| !k.trim().is_empty()),
            target_word_count: self.word_count.unwrap_or(site.default_word_count),
            target_image_count: self.image_count.unwrap_or(site.default_image_count),
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    const CONFIG: &str = r#"{
        "version": "1.0",
        "sites": {
            "tech": {
                "name": "Tech Blog",
                "domain": "tech.example.com",
                "author": "Sam",
                "destination": {"format": "markdown"},
                "output_directory": "out",
                "default_word_count": 1200,
                "default_image_count": 2,
                "default_tags": ["Cloud"]
            }
        }
    }"#;

    fn site() -> SiteConfig {
        let config = load_config_from_str(CONFIG).unwrap();
        PipelineConfig::from_config(&config, "tech").unwrap().site
    }

    #[test]
    fn test_defaults_come_from_site() {
        let request = RunOverrides::default().resolve("  Serverless  ", &site());
        assert_eq!(request.topic, "Serverless");
        assert_eq!(request.target_word_count, 1200);
        assert_eq!(request.target_image_count, 2);
        assert_eq!(request.tags, vec!["Cloud".to_string()]);
        assert!(request.primary_keyword.is_none());
    }

    #[test]
    fn test_overrides_win() {
        let overrides = RunOverrides {
            keyword: Some("lambda".to_string()),
            word_count: Some(900),
            image_count: Some(0),
            tags: Some(vec!["AWS".to_string()]),
        };
        let request = overrides.resolve("Serverless", &site());
        assert_eq!(request.keyword(), "lambda");
        assert_eq!(request.target_word_count, 900);
        assert_eq!(request.target_image_count, 0);
        assert_eq!(request.tags, vec!["AWS".to_string()]);
    }

    #[test]
    fn test_empty_tag_override_falls_back() {
        let overrides = RunOverrides {
            tags: Some(vec![]),
            ..RunOverrides::default()
        };
        assert_eq!(overrides.resolve("x", &site()).tags, vec!["Cloud".to_string()]);
    }

    #[test]
    fn test_unknown_site() {
        let config = load_config_from_str(CONFIG).unwrap();
        assert!(matches!(
            PipelineConfig::from_config(&config, "nope"),
            Err(ConfigError::UnknownSite { .. })
        ));
    }
}
