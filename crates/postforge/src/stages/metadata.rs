use tracing::debug;

use crate::capability::{PromptRequest, TextGenerator};
use crate::pipeline::error::StageError;
use crate::pipeline::progress::Stage;
use crate::pipeline::state::{MetadataDelta, PostState};

use super::parse::{head, parse_metadata};

pub const SLUG_MAX_CHARS: usize = 60;
const FALLBACK_SLUG: &str = "post";

const CONTENT_PREVIEW_CHARS: usize = 1500;
const MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.3;

/// Lowercases, maps anything outside `[a-z0-9-]` to `-`, collapses hyphen
/// runs, trims edge hyphens and cuts to `max_chars`.
///
/// Idempotent: `slugify(&slugify(s, n), n) == slugify(s, n)`.
pub fn slugify(text: &str, max_chars: usize) -> String {
    let mapped: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    let collapsed = mapped
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    // ASCII only at this point, so byte length is char length.
    let cut = &collapsed[..collapsed.len().min(max_chars)];
    cut.trim_end_matches('-').to_string()
}

/// [`slugify`], falling back to `"post"` when nothing usable remains.
pub fn derive_slug(title: &str, max_chars: usize) -> String {
    let slug = slugify(title, max_chars);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

fn build_prompt(state: &PostState) -> String {
    format!(
        "Write SEO metadata for this blog post.

TITLE: {title}
TOPIC: {topic}
PRIMARY KEYWORD: {keyword}

CONTENT PREVIEW:
{preview}

Respond with exactly these lines:
META_DESCRIPTION: <150-160 characters, uses the primary keyword>
EXCERPT: <up to 140 characters for social sharing>
FOCUS_KEYWORD_SHORT: <1-2 words>
FOCUS_KEYWORD_LONG: <3-5 word phrase>
SLUG: <lowercase-hyphenated, at most 60 characters>
",
        title = state.working_title(),
        topic = state.request.topic,
        keyword = state.request.keyword(),
        preview = head(&state.full_text, CONTENT_PREVIEW_CHARS),
    )
}

pub async fn run(state: &PostState, text: &dyn TextGenerator) -> Result<MetadataDelta, StageError> {
    let response = text
        .generate(&PromptRequest::new(build_prompt(state), MAX_TOKENS, TEMPERATURE))
        .await
        .map_err(StageError::capability(Stage::Metadata))?;

    let parsed = parse_metadata(&response);

    let slug = match slugify(&parsed.slug, SLUG_MAX_CHARS) {
        s if s.is_empty() => {
            debug!("No slug in metadata response, deriving from title");
            derive_slug(state.working_title(), SLUG_MAX_CHARS)
        }
        s => s,
    };

    Ok(MetadataDelta {
        meta_description: parsed.meta_description,
        excerpt: parsed.excerpt,
        focus_keyword_short: parsed.focus_keyword_short,
        focus_keyword_long: parsed.focus_keyword_long,
        slug,
    })
}
