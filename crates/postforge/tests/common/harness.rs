//! Isolated pipeline runs against fake capabilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use postforge::capability::{Capabilities, ImageGenerator, SearchProvider, TextGenerator};
use postforge::config::SiteConfig;
use postforge::pipeline::{
    ChannelProgress, GenerationResult, Generator, PipelineConfig, PostState, ProgressEvent,
    RunOverrides,
};

use super::builders::SiteBuilder;
use super::fakes::{CountingImages, FixedSearch, KeyedText};

/// Owns a temp directory for a test's output files.
pub struct TestHarness {
    temp_dir: TempDir,
}

pub struct RunRecord {
    pub result: GenerationResult,
    pub state: PostState,
    pub events: Vec<ProgressEvent>,
}

impl RunRecord {
    pub fn percents(&self) -> Vec<i32> {
        self.events.iter().map(ProgressEvent::percent).collect()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("posts")
    }

    pub fn site(&self) -> SiteBuilder {
        SiteBuilder::new(&self.output_dir())
    }

    /// Files in the output directory, sorted by name.
    pub fn output_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(self.output_dir()) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    pub fn default_fakes() -> (Arc<KeyedText>, Arc<FixedSearch>, Arc<CountingImages>) {
        (
            Arc::new(KeyedText::blog()),
            Arc::new(FixedSearch::new(vec![])),
            Arc::new(CountingImages::new()),
        )
    }

    pub fn generator(
        site: SiteConfig,
        text: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
        images: Arc<dyn ImageGenerator>,
    ) -> Generator {
        Generator::new(
            PipelineConfig::for_site("test", site),
            Capabilities::new(text, search, images),
        )
    }

    pub async fn run(
        &self,
        site: SiteConfig,
        text: Arc<dyn TextGenerator>,
        search: Arc<dyn SearchProvider>,
        images: Arc<dyn ImageGenerator>,
        topic: &str,
        overrides: &RunOverrides,
    ) -> RunRecord {
        let generator = Self::generator(site, text, search, images);

        let progress = ChannelProgress::new(64);
        let mut rx = progress.subscribe();
        let (result, state) = generator.run_with_state(topic, overrides, &progress).await;

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        RunRecord {
            result,
            state,
            events,
        }
    }
}
