//! Sends a finished post to the site's destination.

pub mod document;
pub mod ghost;
pub mod plain;

use std::path::PathBuf;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;

use crate::config::{Destination, DestinationKind, SiteConfig};
use crate::error::StorageError;
use crate::pipeline::state::PostState;

/// Local failures while writing an artifact. Remote and credential problems
/// are reported through an unsuccessful [`OutputResult`] instead.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to render front matter: {0}")]
    FrontMatter(#[from] serde_json::Error),
}

/// Same shape for every destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputResult {
    pub output_type: DestinationKind,
    pub success: bool,
    pub filepath: Option<PathBuf>,
    pub url: Option<String>,
    pub post_id: Option<String>,
    pub slug: String,
    pub error: Option<String>,
}

impl OutputResult {
    pub fn file(output_type: DestinationKind, filepath: PathBuf, slug: &str) -> Self {
        Self {
            output_type,
            success: true,
            filepath: Some(filepath),
            url: None,
            post_id: None,
            slug: slug.to_string(),
            error: None,
        }
    }

    pub fn remote(post_id: String, slug: String, url: String) -> Self {
        Self {
            output_type: DestinationKind::Ghost,
            success: true,
            filepath: None,
            url: Some(url),
            post_id: Some(post_id),
            slug,
            error: None,
        }
    }

    pub fn failed(output_type: DestinationKind, slug: &str, error: impl Into<String>) -> Self {
        Self {
            output_type,
            success: false,
            filepath: None,
            url: None,
            post_id: None,
            slug: slug.to_string(),
            error: Some(error.into()),
        }
    }

    /// File path or remote URL, whichever this destination produced.
    pub fn location(&self) -> Option<String> {
        self.filepath
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| self.url.clone())
    }
}

pub async fn publish(state: &PostState, site: &SiteConfig) -> Result<OutputResult, OutputError> {
    match &site.destination {
        Destination::Mdx => document::write(state, site, Local::now()),
        Destination::Ghost(settings) => Ok(ghost::publish(state, site, settings).await),
        Destination::Markdown => plain::write(state, site),
    }
}

/// Body with the leading `# {title}` heading removed.
pub(crate) fn body_without_title<'a>(full_text: &'a str, title: &str) -> &'a str {
    let heading = format!("# {}", title);
    match full_text.strip_prefix(heading.as_str()) {
        Some(rest) => rest.trim(),
        None => full_text,
    }
}
