use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info};

use crate::error::QueueError;
use crate::storage::FileStorage;

use super::{RunOutcome, TopicQueue};

/// Reads and writes `topics-{site}.json` files in one directory.
pub struct QueueStore {
    storage: FileStorage,
}

impl QueueStore {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            storage: FileStorage::new(directory),
        }
    }

    fn stem(site: &str) -> String {
        format!("topics-{}", site)
    }

    pub fn path(&self, site: &str) -> PathBuf {
        self.storage
            .output_directory()
            .join(format!("{}.json", Self::stem(site)))
    }

    /// A missing file is an empty queue for `site`.
    pub fn load(&self, site: &str) -> Result<TopicQueue, QueueError> {
        let path = self.path(site);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No queue file at {}, starting empty", path.display());
                return Ok(TopicQueue::for_site(site));
            }
            Err(source) => return Err(QueueError::ReadFile { path, source }),
        };

        serde_json::from_str(&content).map_err(|source| QueueError::Parse { path, source })
    }

    /// Stamps `updated_at` and writes the whole document, creating the
    /// directory if needed.
    pub fn save(&self, site: &str, queue: &mut TopicQueue) -> Result<PathBuf, QueueError> {
        queue.updated_at = Some(Local::now().to_rfc3339());
        let content = serde_json::to_string_pretty(queue).map_err(QueueError::Serialize)?;
        let path = self
            .storage
            .write_replacing(&Self::stem(site), "json", &content)?;
        debug!("Saved {} queue items to {}", queue.schedule.len(), path.display());
        Ok(path)
    }

    /// Reloads the queue, records the outcome against `index`, and saves.
    pub fn record_outcome(
        &self,
        site: &str,
        index: usize,
        outcome: &RunOutcome,
    ) -> Result<(), QueueError> {
        let mut queue = self.load(site)?;
        queue.record_outcome(index, outcome, Local::now())?;
        self.save(site, &mut queue)?;
        info!("Recorded queue outcome for item {} of site '{}'", index, site);
        Ok(())
    }
}
