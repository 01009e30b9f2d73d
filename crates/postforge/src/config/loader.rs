use std::path::{Path, PathBuf};

use crate::config::schema::{Config, Destination, SiteConfig};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

/// Default config location: `<platform config dir>/postforge/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("postforge").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        let value: serde_json::Value = serde_yaml::from_str(&content)?;
        load_config_from_value(value)
    } else {
        load_config_from_str(&content)
    }
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;
    load_config_from_value(json_value)
}

fn load_config_from_value(json_value: serde_json::Value) -> Result<Config, ConfigError> {
    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.sites.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one site must be configured".to_string(),
        });
    }

    for (key, site) in &config.sites {
        validate_site(key, site)?;
    }

    Ok(())
}

fn validate_site(key: &str, site: &SiteConfig) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidSite {
        name: key.to_string(),
        reason: reason.to_string(),
    };

    if site.name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if site.output_directory.trim().is_empty() {
        return Err(invalid("output_directory must not be empty"));
    }
    if site.default_word_count == 0 {
        return Err(invalid("default_word_count must be positive"));
    }

    if let Destination::Ghost(ghost) = &site.destination {
        if let Some(url) = &ghost.api_url.value {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(invalid("ghost api_url must be an http(s) URL"));
            }
        }
    }

    Ok(())
}
