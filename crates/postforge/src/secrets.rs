//! Credential resolution for capability API keys and remote publish secrets.
//!
//! A [`SecretSource`] names up to three places a credential can live, tried
//! in priority order:
//!
//! 1. **Direct value** - inline in the config, handy for local testing
//! 2. **File reference** - Docker/Kubernetes secret mounts (`~` is expanded)
//! 3. **Env var reference** - e.g. `ANTHROPIC_API_KEY`, `GHOST_ADMIN_KEY`
//!
//! Resolved values are wrapped in [`SecretString`] so they never end up in
//! `Debug` output or tracing fields by accident.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a secret comes from. Empty strings count as "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl SecretSource {
    pub fn direct(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            file: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn env(name: impl Into<String>) -> Self {
        Self {
            env_var: Some(name.into()),
            ..Self::default()
        }
    }

    /// True when at least one non-empty source is named.
    pub fn is_configured(&self) -> bool {
        non_empty(&self.value).is_some()
            || non_empty(&self.file).is_some()
            || non_empty(&self.env_var).is_some()
    }

    /// Resolves the secret, failing with [`SecretError::NoSourceProvided`]
    /// when nothing is configured.
    pub fn resolve(&self) -> Result<SecretString> {
        if let Some(value) = non_empty(&self.value) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = non_empty(&self.file) {
            return read_file_secret(path);
        }

        if let Some(name) = non_empty(&self.env_var) {
            return read_env_secret(name);
        }

        Err(SecretError::NoSourceProvided)
    }

    /// Like [`resolve`](Self::resolve) but an unconfigured source is `None`.
    /// A configured source that cannot be read is still an error.
    pub fn resolve_optional(&self) -> Result<Option<SecretString>> {
        if !self.is_configured() {
            return Ok(None);
        }
        self.resolve().map(Some)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn read_file_secret(path: &str) -> Result<SecretString> {
    let expanded = expand_home(path);
    std::fs::read_to_string(&expanded)
        .map(|content| SecretString::from(content.trim().to_string()))
        .map_err(|source| SecretError::FileReadError {
            path: expanded,
            source,
        })
}

fn read_env_secret(name: &str) -> Result<SecretString> {
    match std::env::var(name) {
        // Env files often leave a trailing newline.
        Ok(value) => Ok(SecretString::from(value.trim().to_string())),
        Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
            name: name.to_string(),
        }),
        Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
            name: name.to_string(),
        }),
    }
}

/// Expands a leading `~` or `~/` using HOME (or USERPROFILE on Windows).
/// `~user/...` is left untouched.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            if path == "~" {
                return home.to_string_lossy().into_owned();
            }
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
