//! Persistent per-site schedule of topics waiting to be generated.

pub mod runner;
pub mod store;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;
use crate::pipeline::{GenerationResult, RunOverrides};

pub use runner::run_item;
pub use store::QueueStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueResult {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<String>,
    pub topic: String,
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: QueueStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<QueueResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueueItem {
    /// True unless the schedule date (or the id when no date is stored)
    /// parses and falls after `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        let raw = self.scheduled_date.as_deref().unwrap_or(&self.id);
        match parse_schedule_date(raw) {
            Some(date) => date <= today,
            None => true,
        }
    }

    /// Keyword and tags stored with the item; counts come from the site.
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            keyword: Some(self.keyword.clone()).filter(|k| !k.is_empty()),
            tags: Some(self.tags.clone()),
            ..RunOverrides::default()
        }
    }
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or a naive ISO date-time.
pub fn parse_schedule_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

/// How a run for a queue item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { title: String, slug: String },
    Failed { error: String },
}

impl RunOutcome {
    pub fn from_result(result: &GenerationResult) -> Self {
        match &result.summary {
            Some(summary) if result.success => RunOutcome::Completed {
                title: summary.title.clone(),
                slug: summary.slug.clone(),
            },
            _ => RunOutcome::Failed {
                error: result
                    .error
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Completed { .. } => "completed",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSummary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    /// First pending item in stored order, due or not.
    pub next: Option<QueueItem>,
}

/// The persisted document: `{site?, schedule, updated_at}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicQueue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default)]
    pub schedule: Vec<QueueItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl TopicQueue {
    pub fn for_site(site: &str) -> Self {
        Self {
            site: Some(site.to_string()),
            ..Self::default()
        }
    }

    pub fn next_pending(&self) -> Option<(usize, &QueueItem)> {
        self.next_pending_on(Local::now().date_naive())
    }

    /// First pending item, in stored order, that is due on `today`.
    pub fn next_pending_on(&self, today: NaiveDate) -> Option<(usize, &QueueItem)> {
        self.schedule
            .iter()
            .enumerate()
            .find(|(_, item)| item.status == QueueStatus::Pending && item.is_due(today))
    }

    pub fn add(
        &mut self,
        topic: &str,
        date: Option<&str>,
        keyword: Option<&str>,
        tags: Vec<String>,
    ) -> &QueueItem {
        self.add_on(topic, date, keyword, tags, Local::now().date_naive())
    }

    /// Appends a pending item. The id is the scheduled date, suffixed `-1`,
    /// `-2`, ... until it is unique.
    pub fn add_on(
        &mut self,
        topic: &str,
        date: Option<&str>,
        keyword: Option<&str>,
        tags: Vec<String>,
        today: NaiveDate,
    ) -> &QueueItem {
        let scheduled = date
            .map(str::to_string)
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        let item = QueueItem {
            id: self.unique_id(&scheduled),
            scheduled_date: Some(scheduled),
            topic: topic.to_string(),
            keyword: keyword.unwrap_or_default().to_string(),
            tags,
            status: QueueStatus::Pending,
            completed_at: None,
            result: None,
            error: None,
        };

        self.schedule.push(item);
        &self.schedule[self.schedule.len() - 1]
    }

    fn unique_id(&self, base: &str) -> String {
        let taken = |id: &str| self.schedule.iter().any(|item| item.id == id);
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}-{}", base, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn status(&self) -> QueueSummary {
        let count = |status: QueueStatus| self.schedule.iter().filter(|i| i.status == status).count();
        QueueSummary {
            total: self.schedule.len(),
            pending: count(QueueStatus::Pending),
            completed: count(QueueStatus::Completed),
            failed: count(QueueStatus::Failed),
            next: self
                .schedule
                .iter()
                .find(|i| i.status == QueueStatus::Pending)
                .cloned(),
        }
    }

    /// Drops completed items and returns how many went.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.schedule.len();
        self.schedule.retain(|i| i.status != QueueStatus::Completed);
        before - self.schedule.len()
    }

    pub fn record_outcome(
        &mut self,
        index: usize,
        outcome: &RunOutcome,
        at: DateTime<Local>,
    ) -> Result<(), QueueError> {
        let len = self.schedule.len();
        let item = self
            .schedule
            .get_mut(index)
            .ok_or(QueueError::IndexOutOfRange { index, len })?;

        item.completed_at = Some(at.to_rfc3339());
        match outcome {
            RunOutcome::Completed { title, slug } => {
                item.status = QueueStatus::Completed;
                item.result = Some(QueueResult {
                    title: title.clone(),
                    slug: slug.clone(),
                });
                item.error = None;
            }
            RunOutcome::Failed { error } => {
                item.status = QueueStatus::Failed;
                item.error = Some(error.clone());
            }
        }
        Ok(())
    }
}
