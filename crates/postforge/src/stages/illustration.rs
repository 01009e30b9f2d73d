use chrono::{DateTime, Local};
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::capability::{ImageGenerator, PromptRequest, TextGenerator};
use crate::config::SiteConfig;
use crate::pipeline::error::StageError;
use crate::pipeline::progress::Stage;
use crate::pipeline::state::{GeneratedImage, IllustrationDelta, ImagePrompt, PostState};
use crate::storage::FileStorage;

use super::metadata::derive_slug;
use super::parse::{head, parse_image_prompts};

pub const FILENAME_SLUG_MAX_CHARS: usize = 50;

const CONTENT_SUMMARY_CHARS: usize = 2000;
const MAX_TOKENS: u32 = 2000;
const TEMPERATURE: f32 = 0.5;

/// Base for image filenames: the post slug, else one derived from the title.
pub fn filename_base(state: &PostState) -> String {
    if state.slug.is_empty() {
        derive_slug(state.working_title(), FILENAME_SLUG_MAX_CHARS)
    } else {
        state.slug.clone()
    }
}

/// `{base}-{n}-{YYYYmmdd_HHMMSS}.jpg`, with `n` counted from 1.
pub fn image_filename(base: &str, index: usize, at: DateTime<Local>) -> String {
    format!("{}-{}-{}.jpg", base, index + 1, at.format("%Y%m%d_%H%M%S"))
}

fn public_url(prefix: &str, filename: &str) -> Option<String> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        None
    } else {
        Some(format!("{}/{}", prefix, filename))
    }
}

fn build_prompt(state: &PostState, site: &SiteConfig, count: u32) -> String {
    format!(
        "Write {count} image generation prompts for this blog post.

TITLE: {title}
TOPIC: {topic}

CONTENT SUMMARY:
{summary}

Each image needs a detailed generation prompt, alt text, a short filename and
an aspect ratio (1:1 for social, 16:9 for headers, 9:16 for tall pins).
Style: modern, clean illustration with no text in the image, professional and
suitable for the {site} blog.

Use this layout for every image:
IMAGE 1:
Prompt: <generation prompt>
Alt: <alt text>
Filename: <filename>
Aspect: <1:1 | 16:9 | 9:16>
",
        count = count,
        title = state.working_title(),
        topic = state.request.topic,
        summary = head(&state.full_text, CONTENT_SUMMARY_CHARS),
        site = site.name,
    )
}

/// Plans and renders images. Prompt planning failing ends the run; a single
/// image failing is logged and dropped.
pub async fn run(
    state: &PostState,
    site: &SiteConfig,
    text: &dyn TextGenerator,
    images: &dyn ImageGenerator,
    storage: &FileStorage,
) -> Result<IllustrationDelta, StageError> {
    let count = state.request.target_image_count;
    if count == 0 {
        return Ok(IllustrationDelta::default());
    }

    let response = text
        .generate(&PromptRequest::new(
            build_prompt(state, site, count),
            MAX_TOKENS,
            TEMPERATURE,
        ))
        .await
        .map_err(StageError::capability(Stage::Illustration))?;

    let image_prompts = parse_image_prompts(&response, count as usize);
    let base = filename_base(state);
    let started = Local::now();

    let rendered = join_all(
        image_prompts
            .iter()
            .map(|p| images.generate_image(&p.prompt, &p.aspect_ratio)),
    )
    .await;

    let mut generated = Vec::new();
    for (index, (prompt, outcome)) in image_prompts.iter().zip(rendered).enumerate() {
        match outcome {
            Ok(bytes) => match store(storage, site, &base, index, prompt, &bytes, started) {
                Ok(image) => generated.push(image),
                Err(e) => warn!(image = index + 1, error = %e, "Failed to save image, skipping"),
            },
            Err(e) => warn!(image = index + 1, error = %e, "Image generation failed, skipping"),
        }
    }

    info!(
        requested = count,
        generated = generated.len(),
        "Illustration finished"
    );

    let featured_image = generated.first().map(GeneratedImage::reference);

    Ok(IllustrationDelta {
        image_prompts,
        images: generated,
        featured_image,
    })
}

fn store(
    storage: &FileStorage,
    site: &SiteConfig,
    base: &str,
    index: usize,
    prompt: &ImagePrompt,
    bytes: &[u8],
    at: DateTime<Local>,
) -> Result<GeneratedImage, crate::error::StorageError> {
    let path = storage.store_unique(bytes, &image_filename(base, index, at))?;
    let url = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| public_url(&site.images_url_prefix, name));

    Ok(GeneratedImage {
        url,
        path,
        alt_text: prompt.alt_text.clone(),
        aspect_ratio: prompt.aspect_ratio.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::state::GenerationRequest;
    use chrono::TimeZone;

    fn state(title: &str, slug: &str) -> PostState {
        let mut state = PostState::new(GenerationRequest {
            topic: "topic".to_string(),
            primary_keyword: None,
            target_word_count: 900,
            target_image_count: 2,
            tags: vec![],
        });
        state.title = title.to_string();
        state.slug = slug.to_string();
        state
    }

    #[test]
    fn test_filename_base_prefers_slug() {
        assert_eq!(filename_base(&state("Whatever", "edge-ai")), "edge-ai");
    }

    #[test]
    fn test_filename_base_derived_is_capped_at_fifty() {
        let long_title = "A Very Long Title About Many Things That Keeps Going Well Past Fifty";
        let base = filename_base(&state(long_title, ""));
        assert!(base.len() <= FILENAME_SLUG_MAX_CHARS);
        assert!(!base.ends_with('-'));
        assert!(base.starts_with("a-very-long-title"));
    }

    #[test]
    fn test_image_filename() {
        let at = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(image_filename("edge-ai", 0, at), "edge-ai-1-20250102_030405.jpg");
    }

    #[test]
    fn test_stored_image_url_follows_the_written_filename() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path());
        let site: SiteConfig = serde_json::from_value(serde_json::json!({
            "name": "Tech Blog",
            "domain": "tech.example.com",
            "author": "Sam",
            "destination": {"format": "markdown"},
            "output_directory": "unused",
            "images_url_prefix": "/media/"
        }))
        .unwrap();
        let prompt = ImagePrompt {
            prompt: "a chip".to_string(),
            alt_text: "chip".to_string(),
            filename: "chip".to_string(),
            aspect_ratio: "16:9".to_string(),
        };
        let at = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let first = store(&storage, &site, "edge-ai", 0, &prompt, b"jpg", at).unwrap();
        let second = store(&storage, &site, "edge-ai", 0, &prompt, b"jpg", at).unwrap();

        assert_eq!(
            first.url.as_deref(),
            Some("/media/edge-ai-1-20250102_030405.jpg")
        );
        // A taken name is stored under a numbered variant and the URL follows it.
        assert_eq!(
            second.url.as_deref(),
            Some("/media/edge-ai-1-20250102_030405_2.jpg")
        );
        assert!(second.path.ends_with("edge-ai-1-20250102_030405_2.jpg"));
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("/images/", "a.jpg"),
            Some("/images/a.jpg".to_string())
        );
        assert_eq!(public_url("", "a.jpg"), None);
    }
}
