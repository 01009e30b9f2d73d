use tracing::debug;

use crate::capability::{PromptRequest, TextGenerator};
use crate::config::SiteConfig;
use crate::pipeline::error::StageError;
use crate::pipeline::progress::Stage;
use crate::pipeline::state::{OutlineDelta, PostState};

use super::parse::parse_outline;

const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.3;

fn build_prompt(state: &PostState, site: &SiteConfig) -> String {
    let request = &state.request;
    format!(
        "You are an experienced content strategist planning a blog post.

SITE: {name} ({domain})
AUTHOR: {author}
CONTENT FOCUS: {focus}
TONE: {tone}
AUDIENCE: {audience}
READING LEVEL: {level}
REGION: {country} (write in language `{language}`)

TOPIC: {topic}
PRIMARY KEYWORD: {keyword}
TARGET LENGTH: {words} words

Produce an outline containing:
- a search-friendly title that uses the primary keyword naturally
- an introduction with a strong opening hook
- four to six main sections, each with two or three key points
- a conclusion with clear takeaways

Respond in exactly this layout:

TITLE: <title>

SECTIONS:
1. Introduction
   - <key point>

2. <Section title>
   - <key point>
   - <key point>

N. Conclusion
   - <key point>
",
        name = site.name,
        domain = site.domain,
        author = site.author,
        focus = site.content_focus,
        tone = site.tone,
        audience = site.target_audience,
        level = site.reading_level,
        country = site.target_country,
        language = site.target_language,
        topic = request.topic,
        keyword = request.keyword(),
        words = request.target_word_count,
    )
}

/// Plans the post. A response with no recognisable sections still succeeds
/// with an empty outline; the draft stage copes with that.
pub async fn run(
    state: &PostState,
    site: &SiteConfig,
    text: &dyn TextGenerator,
) -> Result<OutlineDelta, StageError> {
    let request = PromptRequest::new(build_prompt(state, site), MAX_TOKENS, TEMPERATURE);
    let plan = text
        .generate(&request)
        .await
        .map_err(StageError::capability(Stage::Outline))?;

    if plan.trim().is_empty() {
        return Err(StageError::EmptyResponse {
            stage: Stage::Outline,
            reason: "empty plan".to_string(),
        });
    }

    let parsed = parse_outline(&plan);
    debug!(
        sections = parsed.sections.len(),
        has_title = !parsed.title.is_empty(),
        "Parsed outline"
    );

    Ok(OutlineDelta {
        plan,
        planned_title: parsed.title,
        sections: parsed.sections,
    })
}
