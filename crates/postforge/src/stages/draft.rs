use tracing::{debug, info};

use crate::capability::{PromptRequest, TextGenerator};
use crate::config::SiteConfig;
use crate::pipeline::error::StageError;
use crate::pipeline::progress::Stage;
use crate::pipeline::state::{
    count_words, reading_time_label, DraftDelta, PostState, SectionOutline,
};

use super::parse::tail;

pub const INTRO_WORDS: u32 = 300;
pub const CONCLUSION_WORDS: u32 = 300;
const MIN_BODY_DIVISOR: usize = 3;

/// Research snippets passed to each prompt.
const RESEARCH_SNIPPETS: usize = 5;
/// Trailing context handed to the next section prompt.
const SECTION_CONTEXT_CHARS: usize = 2000;
/// Trailing context handed to the conclusion prompt.
const CONCLUSION_CONTEXT_CHARS: usize = 4000;

const INTRO_MAX_TOKENS: u32 = 1500;
const SECTION_MAX_TOKENS: u32 = 2000;
const CONCLUSION_MAX_TOKENS: u32 = 1500;
const TEMPERATURE: f32 = 0.4;

/// Words per body section: what is left after the intro and conclusion
/// reserve, split over the outline minus its intro and conclusion entries,
/// never dividing by less than three.
pub fn section_word_budget(target_word_count: u32, outline_len: usize) -> u32 {
    let divisor = outline_len.saturating_sub(2).max(MIN_BODY_DIVISOR) as u32;
    target_word_count.saturating_sub(INTRO_WORDS + CONCLUSION_WORDS) / divisor
}

/// Outline entries for the intro and conclusion are written separately.
fn is_body_section(section: &SectionOutline) -> bool {
    let title = section.title.trim().to_lowercase();
    title != "introduction" && title != "conclusion"
}

pub fn assemble_full_text(
    title: &str,
    introduction: &str,
    sections: &[(String, String)],
    conclusion: &str,
) -> String {
    let mut full = format!("# {}\n\n{}\n\n", title, introduction);
    for (heading, body) in sections {
        full.push_str(&format!("## {}\n\n{}\n\n", heading, body));
    }
    full.push_str("## Conclusion\n\n");
    full.push_str(conclusion);
    full
}

struct DraftContext<'a> {
    title: &'a str,
    research: String,
    site: &'a SiteConfig,
}

fn intro_prompt(ctx: &DraftContext<'_>, state: &PostState) -> String {
    format!(
        "Write the introduction for a blog post.

TITLE: {title}
TOPIC: {topic}
SITE: {site}
AUTHOR: {author}
TOTAL LENGTH: {words} words (the introduction should be about {intro} words)

OUTLINE:
{plan}

RESEARCH:
{research}

Open with a hook, explain why the topic matters now, and preview what the
reader will learn. Write in a {tone} tone. Do not repeat the title.
",
        title = ctx.title,
        topic = state.request.topic,
        site = ctx.site.name,
        author = ctx.site.author,
        words = state.request.target_word_count,
        intro = INTRO_WORDS,
        plan = state.plan,
        research = ctx.research,
        tone = ctx.site.tone,
    )
}

fn section_prompt(
    ctx: &DraftContext<'_>,
    section: &SectionOutline,
    previous: &str,
    budget: u32,
) -> String {
    let key_points = if section.key_points.is_empty() {
        "Cover this topic thoroughly".to_string()
    } else {
        section
            .key_points
            .iter()
            .map(|p| format!("- {}", p))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Write one section of a blog post.

POST TITLE: {title}
SECTION: {section}
KEY POINTS:
{key_points}

RESEARCH:
{research}

EARLIER SECTIONS (context only, do not repeat):
{previous}

Write about {budget} words. Use H3 subheadings where they help and include
concrete examples or data. Write in a {tone} tone. Start with the section
body; the heading is added separately.
",
        title = ctx.title,
        section = section.title,
        research = ctx.research,
        previous = tail(previous, SECTION_CONTEXT_CHARS),
        tone = ctx.site.tone,
    )
}

fn conclusion_prompt(ctx: &DraftContext<'_>, state: &PostState, so_far: &str) -> String {
    format!(
        "Write the conclusion for a blog post.

TITLE: {title}
TOPIC: {topic}
CONTENT SO FAR:
{content}

Write about {words} words: summarise the key insights, give three to five
actionable takeaways, and finish with a forward-looking call to action.
Tone: {tone}
",
        title = ctx.title,
        topic = state.request.topic,
        content = tail(so_far, CONCLUSION_CONTEXT_CHARS),
        words = CONCLUSION_WORDS,
        tone = ctx.site.tone,
    )
}

/// Writes the post. Each section prompt carries the tail of what has been
/// written so far, so the calls run one after another.
pub async fn run(
    state: &PostState,
    site: &SiteConfig,
    text: &dyn TextGenerator,
) -> Result<DraftDelta, StageError> {
    let ctx = DraftContext {
        title: state.working_title(),
        research: state
            .research
            .iter()
            .take(RESEARCH_SNIPPETS)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n\n"),
        site,
    };
    let budget = section_word_budget(state.request.target_word_count, state.sections.len());

    let introduction = text
        .generate(&PromptRequest::new(
            intro_prompt(&ctx, state),
            INTRO_MAX_TOKENS,
            TEMPERATURE,
        ))
        .await
        .map_err(StageError::capability(Stage::Draft))?;

    let mut written = introduction.clone();
    let mut sections: Vec<(String, String)> = Vec::new();

    for section in state.sections.iter().filter(|s| is_body_section(s)) {
        debug!(section = %section.title, budget, "Drafting section");
        let body = text
            .generate(&PromptRequest::new(
                section_prompt(&ctx, section, &written, budget),
                SECTION_MAX_TOKENS,
                TEMPERATURE,
            ))
            .await
            .map_err(StageError::capability(Stage::Draft))?;

        written.push_str(&format!("\n\n## {}\n\n{}", section.title, body));
        sections.push((section.title.clone(), body));
    }

    let conclusion = text
        .generate(&PromptRequest::new(
            conclusion_prompt(&ctx, state, &written),
            CONCLUSION_MAX_TOKENS,
            TEMPERATURE,
        ))
        .await
        .map_err(StageError::capability(Stage::Draft))?;

    let full_text = assemble_full_text(ctx.title, &introduction, &sections, &conclusion);
    let word_count = count_words(&full_text);
    info!(sections = sections.len(), word_count, "Draft assembled");

    Ok(DraftDelta {
        title: ctx.title.to_string(),
        introduction,
        sections_content: sections
            .iter()
            .map(|(heading, body)| format!("## {}\n\n{}", heading, body))
            .collect(),
        conclusion,
        full_text,
        word_count,
        reading_time: reading_time_label(word_count),
    })
}
