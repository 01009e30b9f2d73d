//! Best-effort parsers for the loosely formatted text the model returns.
//!
//! None of these fail. Every field has a fallback, and malformed input just
//! yields fewer or emptier values.

use crate::pipeline::state::{ImagePrompt, SectionOutline};

pub const META_DESCRIPTION_MAX_CHARS: usize = 160;
pub const EXCERPT_MAX_CHARS: usize = 140;

const ASPECT_RATIOS: [&str; 3] = ["1:1", "16:9", "9:16"];
const DEFAULT_ASPECT_RATIO: &str = "16:9";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutline {
    /// Empty when no `TITLE:` line was found.
    pub title: String,
    pub sections: Vec<SectionOutline>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedMetadata {
    pub meta_description: String,
    pub excerpt: String,
    pub focus_keyword_short: String,
    pub focus_keyword_long: String,
    /// Raw model slug, not yet normalised.
    pub slug: String,
}

/// Strips leading markdown emphasis and heading markers.
fn clean(line: &str) -> &str {
    line.trim().trim_start_matches(['#', '*']).trim()
}

/// Value after `label` when the line starts with it.
fn field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    line.strip_prefix(label)
        .map(|rest| rest.trim().trim_start_matches('*').trim())
}

pub fn parse_outline(text: &str) -> ParsedOutline {
    let mut outline = ParsedOutline::default();
    let mut current: Option<SectionOutline> = None;

    for raw in text.lines() {
        let line = clean(raw);

        if outline.title.is_empty() {
            if let Some(title) = field(line, "TITLE:") {
                outline.title = title.trim_end_matches('*').trim().to_string();
                continue;
            }
        }

        let starts_numbered = line.chars().next().is_some_and(|c| c.is_ascii_digit());
        if starts_numbered {
            if let Some((_, title)) = line.split_once('.') {
                if let Some(section) = current.take() {
                    outline.sections.push(section);
                }
                current = Some(SectionOutline {
                    title: title.trim().trim_matches('*').trim().to_string(),
                    key_points: Vec::new(),
                });
                continue;
            }
        }

        if let (Some(section), Some(point)) = (current.as_mut(), line.strip_prefix('-')) {
            let point = point.trim();
            if !point.is_empty() {
                section.key_points.push(point.to_string());
            }
        }
    }

    if let Some(section) = current {
        outline.sections.push(section);
    }

    outline
}

pub fn parse_metadata(text: &str) -> ParsedMetadata {
    let mut parsed = ParsedMetadata::default();

    for raw in text.lines() {
        let line = clean(raw);
        if let Some(v) = field(line, "META_DESCRIPTION:") {
            parsed.meta_description = head(v, META_DESCRIPTION_MAX_CHARS).to_string();
        } else if let Some(v) = field(line, "EXCERPT:") {
            parsed.excerpt = head(v, EXCERPT_MAX_CHARS).to_string();
        } else if let Some(v) = field(line, "FOCUS_KEYWORD_SHORT:") {
            parsed.focus_keyword_short = v.to_string();
        } else if let Some(v) = field(line, "FOCUS_KEYWORD_LONG:") {
            parsed.focus_keyword_long = v.to_string();
        } else if let Some(v) = field(line, "SLUG:") {
            parsed.slug = v.to_string();
        }
    }

    parsed
}

#[derive(Default)]
struct PromptBlock {
    prompt: Option<String>,
    alt: Option<String>,
    filename: Option<String>,
    aspect: Option<String>,
}

impl PromptBlock {
    /// `None` when the block never got a prompt line.
    fn finish(self, position: usize) -> Option<ImagePrompt> {
        let prompt = self.prompt.filter(|p| !p.is_empty())?;
        let aspect_ratio = self
            .aspect
            .filter(|a| ASPECT_RATIOS.contains(&a.as_str()))
            .unwrap_or_else(|| DEFAULT_ASPECT_RATIO.to_string());

        Some(ImagePrompt {
            prompt,
            alt_text: self.alt.unwrap_or_default(),
            filename: self
                .filename
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| format!("image-{}", position)),
            aspect_ratio,
        })
    }
}

/// Parses `IMAGE n:` blocks, keeping at most `count` prompts.
pub fn parse_image_prompts(text: &str, count: usize) -> Vec<ImagePrompt> {
    let mut prompts = Vec::new();
    let mut block = PromptBlock::default();

    for raw in text.lines() {
        let line = clean(raw);
        if line.starts_with("IMAGE") {
            if let Some(p) = std::mem::take(&mut block).finish(prompts.len() + 1) {
                prompts.push(p);
            }
        } else if let Some(v) = field(line, "Prompt:") {
            block.prompt = Some(v.to_string());
        } else if let Some(v) = field(line, "Alt:") {
            block.alt = Some(v.to_string());
        } else if let Some(v) = field(line, "Filename:") {
            block.filename = Some(v.to_string());
        } else if let Some(v) = field(line, "Aspect:") {
            block.aspect = Some(v.to_string());
        }
    }

    if let Some(p) = block.finish(prompts.len() + 1) {
        prompts.push(p);
    }

    prompts.truncate(count);
    prompts
}

/// First `max_chars` characters of `text`.
pub fn head(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Last `max_chars` characters of `text`.
pub fn tail(text: &str, max_chars: usize) -> &str {
    let total = text.chars().count();
    if total <= max_chars {
        return text;
    }
    text.char_indices()
        .nth(total - max_chars)
        .map(|(idx, _)| &text[idx..])
        .unwrap_or("")
}
