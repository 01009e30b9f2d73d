//! In-memory stand-ins for the hosted services.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use postforge::capability::{
    CapabilityError, ImageGenerator, PromptRequest, Result, SearchProvider, SearchQuery,
    SearchResult, TextGenerator,
};

pub const OUTLINE_RESPONSE: &str = "TITLE: Edge AI Explained\n\
\n\
SECTIONS:\n\
1. Introduction\n\
- Why edge inference matters\n\
2. Hardware Shifts\n\
- NPUs in laptops\n\
- Power budgets\n\
3. Software Stacks\n\
- Quantized runtimes\n\
4. Conclusion\n\
- Takeaways\n";

pub const METADATA_RESPONSE: &str = "META_DESCRIPTION: A practical look at running AI models on local hardware.\n\
EXCERPT: Why edge inference is finally practical.\n\
FOCUS_KEYWORD_SHORT: edge ai\n\
FOCUS_KEYWORD_LONG: running ai models on local hardware\n\
SLUG: Edge AI Explained!\n";

pub const IMAGE_PROMPTS_RESPONSE: &str = "IMAGE 1:\n\
Prompt: a laptop with a glowing neural chip\n\
Alt: laptop chip\n\
Filename: chip\n\
Aspect: 16:9\n\
\n\
IMAGE 2:\n\
Prompt: a rack of tiny edge devices\n\
Alt: edge devices\n\
Filename: devices\n\
Aspect: 1:1\n";

/// Answers by prompt prefix, the most recently added route first; every
/// prompt is recorded.
pub struct KeyedText {
    routes: Vec<(String, std::result::Result<String, String>)>,
    fallback: String,
    calls: Mutex<Vec<PromptRequest>>,
}

impl KeyedText {
    pub fn new(fallback: &str) -> Self {
        Self {
            routes: Vec::new(),
            fallback: fallback.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Canned answers for every stage of a normal run.
    pub fn blog() -> Self {
        Self::new("Edge devices now run models that needed a data centre five years ago.")
            .route("You are an experienced content strategist", OUTLINE_RESPONSE)
            .route("Write SEO metadata", METADATA_RESPONSE)
            .route("Write the introduction", "Local inference is changing how teams ship AI features.")
            .route("Write the conclusion", "Start small, measure latency, and move models closer to users.")
            .route_containing_images()
    }

    pub fn route(mut self, prefix: &str, response: &str) -> Self {
        self.routes.insert(0, (prefix.to_string(), Ok(response.to_string())));
        self
    }

    pub fn fail(mut self, prefix: &str, message: &str) -> Self {
        self.routes.insert(0, (prefix.to_string(), Err(message.to_string())));
        self
    }

    fn route_containing_images(self) -> Self {
        // Image planning prompts start with the requested count.
        (1..=9).fold(self, |fake, n| {
            let prefix = format!("Write {} image generation prompts", n);
            fake.route(&prefix, IMAGE_PROMPTS_RESPONSE)
        })
    }

    pub fn calls(&self) -> Vec<PromptRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for KeyedText {
    async fn generate(&self, request: &PromptRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.clone());
        for (prefix, response) in &self.routes {
            if request.prompt.starts_with(prefix.as_str()) {
                return response
                    .clone()
                    .map_err(|message| CapabilityError::Http { status: 500, message });
            }
        }
        Ok(self.fallback.clone())
    }
}

/// Returns the same results for every query.
pub struct FixedSearch {
    pub results: Vec<SearchResult>,
    queries: Mutex<Vec<SearchQuery>>,
}

impl FixedSearch {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(self.results.clone())
    }
}

pub struct FailingSearch;

#[async_trait]
impl SearchProvider for FailingSearch {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchResult>> {
        Err(CapabilityError::Quota("monthly limit reached".to_string()))
    }
}

/// Counts calls and refuses the prompts listed in `refuse`.
pub struct CountingImages {
    calls: AtomicUsize,
    refuse: Vec<String>,
}

impl CountingImages {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            refuse: Vec::new(),
        }
    }

    pub fn refusing(prompt: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            refuse: vec![prompt.to_string()],
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for CountingImages {
    async fn generate_image(&self, prompt: &str, _aspect_ratio: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.refuse.iter().any(|p| p == prompt) {
            return Err(CapabilityError::Refused("safety filter".to_string()));
        }
        Ok(vec![0xFF, 0xD8, 0xFF, 0xE0])
    }
}

pub fn search_result(title: &str, url: &str, content: &str) -> SearchResult {
    SearchResult {
        title: title.to_string(),
        url: url.to_string(),
        content: content.to_string(),
    }
}
