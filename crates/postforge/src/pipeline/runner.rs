use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::capability::Capabilities;
use crate::output::{self, OutputResult};
use crate::sanitize;
use crate::stages;
use crate::storage::FileStorage;

use super::config::{PipelineConfig, RunOverrides};
use super::error::StageError;
use super::progress::{ProgressEvent, ProgressReporter, Stage};
use super::state::{PostState, StateDelta};

const TOPIC_LOG_CHARS: usize = 80;

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub title: String,
    pub slug: String,
    pub word_count: usize,
    pub reading_time: String,
    pub images_generated: usize,
    pub output: OutputResult,
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub run_id: String,
    pub topic: String,
    pub success: bool,
    pub summary: Option<GenerationSummary>,
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn success(run_id: &str, topic: &str, summary: GenerationSummary) -> Self {
        Self {
            run_id: run_id.to_string(),
            topic: topic.to_string(),
            success: true,
            summary: Some(summary),
            error: None,
        }
    }

    pub fn failure(run_id: &str, topic: &str, error: String) -> Self {
        Self {
            run_id: run_id.to_string(),
            topic: topic.to_string(),
            success: false,
            summary: None,
            error: Some(error),
        }
    }
}

/// Runs the six stages for one topic against one site.
pub struct Generator {
    config: PipelineConfig,
    capabilities: Capabilities,
    image_storage: FileStorage,
}

impl Generator {
    pub fn new(config: PipelineConfig, capabilities: Capabilities) -> Self {
        let image_storage = FileStorage::new(&config.site.images_directory);
        Self {
            config,
            capabilities,
            image_storage,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(
        &self,
        topic: &str,
        overrides: &RunOverrides,
        progress: &dyn ProgressReporter,
    ) -> GenerationResult {
        self.run_with_state(topic, overrides, progress).await.0
    }

    /// Same as [`Generator::run`], also handing back the final record.
    pub async fn run_with_state(
        &self,
        topic: &str,
        overrides: &RunOverrides,
        progress: &dyn ProgressReporter,
    ) -> (GenerationResult, PostState) {
        let run_id = Uuid::new_v4().to_string();
        let request = overrides.resolve(topic, &self.config.site);
        let span = info_span!("pipeline",
            run_id = %run_id,
            site = %self.config.site_key,
            topic = %sanitize::truncate_for_log(&request.topic, TOPIC_LOG_CHARS),
        );

        let started = Instant::now();
        let mut state = PostState::new(request);

        match self.execute(&mut state, progress).instrument(span).await {
            Ok(output) => {
                let duration = started.elapsed();
                progress.report(ProgressEvent::Completed { elapsed: duration });
                info!(
                    run_id = %run_id,
                    slug = %state.slug,
                    words = state.word_count,
                    images = state.images.len(),
                    "Generation complete in {:.1}s",
                    duration.as_secs_f64()
                );

                let summary = GenerationSummary {
                    title: state.title.clone(),
                    slug: state.slug.clone(),
                    word_count: state.word_count,
                    reading_time: state.reading_time.clone(),
                    images_generated: state.images.len(),
                    output,
                    duration,
                };
                (GenerationResult::success(&run_id, topic, summary), state)
            }
            Err(e) => {
                let message = e.to_string();
                warn!(run_id = %run_id, "Generation failed: {}", message);
                progress.report(ProgressEvent::Failed {
                    error: message.clone(),
                });
                (GenerationResult::failure(&run_id, topic, message), state)
            }
        }
    }

    async fn execute(
        &self,
        state: &mut PostState,
        progress: &dyn ProgressReporter,
    ) -> Result<OutputResult, StageError> {
        if state.request.topic.is_empty() {
            return Err(StageError::InvalidRequest("topic must not be empty".to_string()));
        }
        if state.request.target_word_count == 0 {
            return Err(StageError::InvalidRequest(
                "target word count must be positive".to_string(),
            ));
        }

        let site = &self.config.site;
        let caps = &self.capabilities;

        progress.report(ProgressEvent::started(Stage::Outline));
        let delta = stages::outline::run(state, site, caps.text.as_ref())
            .instrument(info_span!("outline"))
            .await?;
        debug!(sections = delta.sections.len(), "Outline ready");
        merge(state, delta);

        progress.report(ProgressEvent::started(Stage::Research));
        let delta = stages::research::run(state, site, caps.search.as_ref())
            .instrument(info_span!("research"))
            .await;
        merge(state, delta);

        progress.report(ProgressEvent::started(Stage::Draft));
        let delta = stages::draft::run(state, site, caps.text.as_ref())
            .instrument(info_span!("draft"))
            .await?;
        merge(state, delta);

        progress.report(ProgressEvent::started(Stage::Metadata));
        let delta = stages::metadata::run(state, caps.text.as_ref())
            .instrument(info_span!("metadata"))
            .await?;
        merge(state, delta);

        let image_count = state.request.target_image_count;
        if image_count == 0 {
            progress.report(ProgressEvent::Skipped {
                stage: Stage::Illustration,
                message: "Skipping image generation...".to_string(),
            });
        } else {
            progress.report(ProgressEvent::Started {
                stage: Stage::Illustration,
                message: format!("Generating {} images...", image_count),
            });
            let delta = stages::illustration::run(
                state,
                site,
                caps.text.as_ref(),
                caps.images.as_ref(),
                &self.image_storage,
            )
            .instrument(info_span!("illustration"))
            .await?;
            merge(state, delta);
        }

        progress.report(ProgressEvent::started(Stage::Output));
        let result = output::publish(state, site)
            .instrument(info_span!("output", destination = %site.destination.kind()))
            .await?;

        if !result.success {
            return Err(StageError::OutputRejected {
                destination: result.output_type.to_string(),
                message: result
                    .error
                    .unwrap_or_else(|| "unknown output error".to_string()),
            });
        }

        Ok(result)
    }
}

/// The only place the record changes during a run.
fn merge(state: &mut PostState, delta: impl Into<StateDelta>) {
    let current = std::mem::take(state);
    *state = current.apply(delta.into());
}
