use tracing::info;

use crate::config::{DestinationKind, SiteConfig};
use crate::pipeline::state::PostState;
use crate::sanitize;
use crate::storage::FileStorage;

use super::{OutputError, OutputResult};

/// Writes the raw assembled text to `{output_dir}/{slug}.md`, replacing any
/// earlier file of the same name.
pub fn write(state: &PostState, site: &SiteConfig) -> Result<OutputResult, OutputError> {
    let storage = FileStorage::new(&site.output_directory);
    let path = storage.write_replacing(&state.slug, "md", &state.full_text)?;

    info!(file = %sanitize::redact_path(&path), "Wrote markdown post");
    Ok(OutputResult::file(DestinationKind::Markdown, path, &state.slug))
}
