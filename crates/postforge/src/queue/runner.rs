use log::warn;
use uuid::Uuid;

use crate::capability::CapabilityError;
use crate::error::QueueError;
use crate::pipeline::{GenerationResult, Generator, ProgressReporter};

use super::{QueueItem, QueueStore, RunOutcome};

/// Generates `item` and records the outcome at `index` before returning.
///
/// `generator` is whatever building the capability clients produced; when
/// that failed the item is recorded as failed without running any stage.
pub async fn run_item(
    store: &QueueStore,
    site: &str,
    index: usize,
    item: &QueueItem,
    generator: Result<Generator, CapabilityError>,
    progress: &dyn ProgressReporter,
) -> Result<(GenerationResult, RunOutcome), QueueError> {
    let result = match generator {
        Ok(generator) => generator.run(&item.topic, &item.overrides(), progress).await,
        Err(e) => {
            warn!("Queue item {} not run: {}", item.id, e);
            GenerationResult::failure(
                &Uuid::new_v4().to_string(),
                &item.topic,
                format!("Failed to set up capabilities: {}", e),
            )
        }
    };

    let outcome = RunOutcome::from_result(&result);
    store.record_outcome(site, index, &outcome)?;
    Ok((result, outcome))
}
