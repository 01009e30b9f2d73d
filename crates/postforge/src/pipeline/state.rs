use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Inputs fixed when the run starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub primary_keyword: Option<String>,
    pub target_word_count: u32,
    pub target_image_count: u32,
    pub tags: Vec<String>,
}

impl GenerationRequest {
    /// The primary keyword, falling back to the topic.
    pub fn keyword(&self) -> &str {
        self.primary_keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or(&self.topic)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutline {
    pub title: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrompt {
    pub prompt: String,
    pub alt_text: String,
    pub filename: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub path: PathBuf,
    pub alt_text: String,
    pub aspect_ratio: String,
    pub url: Option<String>,
}

impl GeneratedImage {
    /// Public URL when one is known, else the storage path.
    pub fn reference(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// The record threaded through a run.
///
/// Stages only ever see `&PostState`. The runner is the sole writer and folds
/// each stage's delta in with [`PostState::apply`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PostState {
    pub request: GenerationRequest,

    // Outline
    pub plan: String,
    pub planned_title: String,
    pub sections: Vec<SectionOutline>,

    // Research
    pub research: Vec<String>,
    pub academic_sources: Vec<String>,

    // Draft
    pub title: String,
    pub introduction: String,
    pub sections_content: Vec<String>,
    pub conclusion: String,
    pub full_text: String,
    pub word_count: usize,
    pub reading_time: String,

    // Metadata
    pub meta_description: String,
    pub excerpt: String,
    pub focus_keyword_short: String,
    pub focus_keyword_long: String,
    pub slug: String,

    // Illustration
    pub image_prompts: Vec<ImagePrompt>,
    pub images: Vec<GeneratedImage>,
    pub featured_image: Option<String>,

    /// Reserved for per-stage soft failures; nothing writes it yet.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineDelta {
    pub plan: String,
    pub planned_title: String,
    pub sections: Vec<SectionOutline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResearchDelta {
    pub research: Vec<String>,
    pub academic_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftDelta {
    pub title: String,
    pub introduction: String,
    pub sections_content: Vec<String>,
    pub conclusion: String,
    pub full_text: String,
    pub word_count: usize,
    pub reading_time: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDelta {
    pub meta_description: String,
    pub excerpt: String,
    pub focus_keyword_short: String,
    pub focus_keyword_long: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IllustrationDelta {
    pub image_prompts: Vec<ImagePrompt>,
    pub images: Vec<GeneratedImage>,
    pub featured_image: Option<String>,
}

/// What one stage contributes to the record.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    Outline(OutlineDelta),
    Research(ResearchDelta),
    Draft(DraftDelta),
    Metadata(MetadataDelta),
    Illustration(IllustrationDelta),
}

impl PostState {
    pub fn new(request: GenerationRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    /// Folds a stage's delta into the record. Fields outside the delta's
    /// stage are left untouched.
    pub fn apply(mut self, delta: StateDelta) -> Self {
        match delta {
            StateDelta::Outline(d) => {
                self.plan = d.plan;
                self.planned_title = d.planned_title;
                self.sections = d.sections;
            }
            StateDelta::Research(d) => {
                self.research = d.research;
                self.academic_sources = d.academic_sources;
            }
            StateDelta::Draft(d) => {
                self.title = d.title;
                self.introduction = d.introduction;
                self.sections_content = d.sections_content;
                self.conclusion = d.conclusion;
                self.full_text = d.full_text;
                self.word_count = d.word_count;
                self.reading_time = d.reading_time;
            }
            StateDelta::Metadata(d) => {
                self.meta_description = d.meta_description;
                self.excerpt = d.excerpt;
                self.focus_keyword_short = d.focus_keyword_short;
                self.focus_keyword_long = d.focus_keyword_long;
                self.slug = d.slug;
            }
            StateDelta::Illustration(d) => {
                self.image_prompts = d.image_prompts;
                self.images = d.images;
                self.featured_image = d.featured_image;
            }
        }
        self
    }

    /// Best title available at this point in the run.
    pub fn working_title(&self) -> &str {
        [&self.title, &self.planned_title]
            .into_iter()
            .find(|t| !t.trim().is_empty())
            .map(String::as_str)
            .unwrap_or(&self.request.topic)
    }
}

impl From<OutlineDelta> for StateDelta {
    fn from(d: OutlineDelta) -> Self {
        StateDelta::Outline(d)
    }
}

impl From<ResearchDelta> for StateDelta {
    fn from(d: ResearchDelta) -> Self {
        StateDelta::Research(d)
    }
}

impl From<DraftDelta> for StateDelta {
    fn from(d: DraftDelta) -> Self {
        StateDelta::Draft(d)
    }
}

impl From<MetadataDelta> for StateDelta {
    fn from(d: MetadataDelta) -> Self {
        StateDelta::Metadata(d)
    }
}

impl From<IllustrationDelta> for StateDelta {
    fn from(d: IllustrationDelta) -> Self {
        StateDelta::Illustration(d)
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `"{n} min read"` with `n = max(1, words / 200)`.
pub fn reading_time_label(word_count: usize) -> String {
    format!("{} min read", (word_count / 200).max(1))
}
