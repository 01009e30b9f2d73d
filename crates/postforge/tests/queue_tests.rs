//! Topic queue persistence and scheduling through `QueueStore`.

mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::*;
use postforge::capability::CapabilityError;
use postforge::pipeline::NoopProgress;
use postforge::queue::{run_item, QueueStatus, QueueStore, RunOutcome};

#[test]
fn test_selects_first_due_pending_item() {
    let harness = TestHarness::new();
    let store = QueueStore::new(harness.root());
    std::fs::write(
        store.path("tech"),
        r#"{
            "site": "tech",
            "schedule": [
                {"id": "a", "topic": "A", "status": "completed"},
                {"id": "b", "topic": "B", "status": "pending", "scheduled_date": "2099-01-01"},
                {"id": "c", "topic": "C", "status": "pending", "scheduled_date": "2000-01-01"}
            ]
        }"#,
    )
    .unwrap();

    let queue = store.load("tech").unwrap();
    let (index, item) = queue.next_pending().unwrap();
    assert_eq!(index, 2);
    assert_eq!(item.id, "c");
}

#[test]
fn test_add_status_clear_lifecycle() {
    let harness = TestHarness::new();
    let store = QueueStore::new(harness.root().join("queues"));
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let mut queue = store.load("tech").unwrap();
    queue.add_on("First", Some("2025-03-01"), Some("first kw"), vec![], today);
    queue.add_on("Second", Some("2025-03-01"), None, vec!["AI".to_string()], today);
    queue.add_on("Later", Some("2025-04-01"), None, vec![], today);
    store.save("tech", &mut queue).unwrap();

    let ids: Vec<String> = store
        .load("tech")
        .unwrap()
        .schedule
        .iter()
        .map(|i| i.id.clone())
        .collect();
    assert_eq!(ids, vec!["2025-03-01", "2025-03-01-1", "2025-04-01"]);

    store
        .record_outcome(
            "tech",
            0,
            &RunOutcome::Completed {
                title: "First Post".to_string(),
                slug: "first-post".to_string(),
            },
        )
        .unwrap();
    store
        .record_outcome(
            "tech",
            1,
            &RunOutcome::Failed {
                error: "draft stage failed".to_string(),
            },
        )
        .unwrap();

    let mut queue = store.load("tech").unwrap();
    let summary = queue.status();
    assert_eq!((summary.total, summary.pending, summary.completed, summary.failed), (3, 1, 1, 1));
    assert_eq!(summary.next.unwrap().topic, "Later");
    assert!(queue.next_pending_on(today).is_none());

    assert_eq!(queue.clear_completed(), 1);
    store.save("tech", &mut queue).unwrap();

    let reloaded = store.load("tech").unwrap();
    assert_eq!(reloaded.schedule.len(), 2);
    assert_eq!(reloaded.schedule[0].status, QueueStatus::Failed);
    assert_eq!(reloaded.schedule[0].error.as_deref(), Some("draft stage failed"));
}

#[test]
fn test_queue_file_shape() {
    let harness = TestHarness::new();
    let store = QueueStore::new(harness.root());

    let mut queue = store.load("travel").unwrap();
    queue.add("Kyoto in winter", Some("2025-12-01"), None, vec!["Japan".to_string()]);
    let path = store.save("travel", &mut queue).unwrap();

    assert_eq!(path.file_name().unwrap(), "topics-travel.json");
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(raw["site"], "travel");
    assert!(raw["updated_at"].is_string());
    let item = &raw["schedule"][0];
    assert_eq!(item["id"], "2025-12-01");
    assert_eq!(item["status"], "pending");
    assert_eq!(item["keyword"], "");
    assert_eq!(item["tags"][0], "Japan");
}

#[tokio::test]
async fn test_queue_item_drives_a_run() {
    let harness = TestHarness::new();
    let store = QueueStore::new(harness.root().join("queues"));

    let mut queue = store.load("tech").unwrap();
    queue.add("Edge AI", Some("2000-01-01"), Some("edge inference"), vec!["Chips".to_string()]);
    store.save("tech", &mut queue).unwrap();

    let queue = store.load("tech").unwrap();
    let (index, item) = queue.next_pending().unwrap();
    let (text, search, images) = TestHarness::default_fakes();
    let site = harness.site().image_count(0).build();
    let generator = TestHarness::generator(site, text.clone(), search, images);

    let (result, outcome) = run_item(&store, "tech", index, item, Ok(generator), &NoopProgress)
        .await
        .unwrap();
    assert!(result.success, "{:?}", result.error);
    assert_eq!(
        outcome,
        RunOutcome::Completed {
            title: "Edge AI Explained".to_string(),
            slug: "edge-ai-explained".to_string(),
        }
    );
    // The stored keyword reached the prompts.
    assert!(text.calls().iter().any(|c| c.prompt.contains("edge inference")));

    let done = store.load("tech").unwrap();
    assert_eq!(done.schedule[0].status, QueueStatus::Completed);
    let stored = done.schedule[0].result.as_ref().unwrap();
    assert_eq!(stored.slug, "edge-ai-explained");
    assert!(done.schedule[0].completed_at.is_some());
    assert!(done.next_pending().is_none());
}

#[tokio::test]
async fn test_queue_item_marked_failed_when_capabilities_cannot_be_built() {
    let harness = TestHarness::new();
    let store = QueueStore::new(harness.root().join("queues"));

    let mut queue = store.load("tech").unwrap();
    queue.add("Edge AI", Some("2000-01-01"), None, vec![]);
    store.save("tech", &mut queue).unwrap();

    let queue = store.load("tech").unwrap();
    let (index, item) = queue.next_pending().unwrap();
    let missing_key = Err(CapabilityError::NotConfigured(
        "ANTHROPIC_API_KEY is not set".to_string(),
    ));

    let (result, outcome) = run_item(&store, "tech", index, item, missing_key, &NoopProgress)
        .await
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.topic, "Edge AI");
    assert!(matches!(outcome, RunOutcome::Failed { .. }));

    let stored = &store.load("tech").unwrap().schedule[0];
    assert_eq!(stored.status, QueueStatus::Failed);
    assert!(stored.completed_at.is_some());
    let error = stored.error.as_deref().unwrap();
    assert!(error.contains("ANTHROPIC_API_KEY is not set"), "{}", error);
    assert!(harness.output_files().is_empty());
}

#[tokio::test]
async fn test_failed_run_is_recorded_before_returning() {
    let harness = TestHarness::new();
    let store = QueueStore::new(harness.root().join("queues"));

    let mut queue = store.load("tech").unwrap();
    queue.add("Edge AI", Some("2000-01-01"), None, vec![]);
    store.save("tech", &mut queue).unwrap();

    let queue = store.load("tech").unwrap();
    let (index, item) = queue.next_pending().unwrap();
    let text = Arc::new(KeyedText::blog().fail("Write the introduction", "boom"));
    let generator = TestHarness::generator(
        harness.site().image_count(0).build(),
        text,
        Arc::new(FixedSearch::new(vec![])),
        Arc::new(CountingImages::new()),
    );

    let (result, _) = run_item(&store, "tech", index, item, Ok(generator), &NoopProgress)
        .await
        .unwrap();
    assert!(!result.success);

    let stored = &store.load("tech").unwrap().schedule[0];
    assert_eq!(stored.status, QueueStatus::Failed);
    assert!(stored.error.as_deref().unwrap().starts_with("draft stage failed"));
}
