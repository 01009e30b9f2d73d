use chrono::{DateTime, Local, NaiveDate};
use tracing::info;

use crate::config::{DestinationKind, SiteConfig};
use crate::pipeline::state::PostState;
use crate::sanitize;
use crate::storage::FileStorage;

use super::{body_without_title, OutputError, OutputResult};

pub const DEFAULT_IMAGE: &str = "/images/blog-default.jpg";
const EXTENSION: &str = "mdx";

/// First generated image URL, else the featured image, else the default.
fn front_matter_image(state: &PostState) -> String {
    state
        .images
        .first()
        .and_then(|img| img.url.clone())
        .or_else(|| state.featured_image.clone())
        .unwrap_or_else(|| DEFAULT_IMAGE.to_string())
}

/// Renders the `---` block. String values go through JSON quoting, which
/// YAML reads as double-quoted scalars.
pub fn render_front_matter(
    state: &PostState,
    site: &SiteConfig,
    date: NaiveDate,
) -> Result<String, OutputError> {
    let tags = if state.request.tags.is_empty() {
        &site.default_tags
    } else {
        &state.request.tags
    };

    let quote = |s: &str| serde_json::to_string(s);

    Ok(format!(
        "---\ntitle: {}\ndescription: {}\ndate: {}\nauthor: {}\ntags: {}\nimage: {}\nreadingTime: {}\n---\n\n",
        quote(&state.title)?,
        quote(&state.meta_description)?,
        quote(&date.format("%Y-%m-%d").to_string())?,
        quote(&site.author)?,
        serde_json::to_string(tags)?,
        quote(&front_matter_image(state))?,
        quote(&state.reading_time)?,
    ))
}

pub fn render_document(
    state: &PostState,
    site: &SiteConfig,
    date: NaiveDate,
) -> Result<String, OutputError> {
    let front_matter = render_front_matter(state, site, date)?;
    Ok(front_matter + body_without_title(&state.full_text, &state.title))
}

/// Writes `{slug}.mdx`, or `{slug}-{YYYYMMDDHHMMSS}.mdx` when the plain name
/// is taken.
pub fn write(
    state: &PostState,
    site: &SiteConfig,
    now: DateTime<Local>,
) -> Result<OutputResult, OutputError> {
    let content = render_document(state, site, now.date_naive())?;
    let storage = FileStorage::new(&site.output_directory);
    let path = storage.write_document_at(&state.slug, EXTENSION, &content, now)?;

    info!(file = %sanitize::redact_path(&path), "Wrote MDX post");
    Ok(OutputResult::file(DestinationKind::Mdx, path, &state.slug))
}
