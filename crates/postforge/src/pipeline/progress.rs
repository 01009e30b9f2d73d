use std::fmt;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

/// The six fixed stages, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Outline,
    Research,
    Draft,
    Metadata,
    Illustration,
    Output,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Outline,
        Stage::Research,
        Stage::Draft,
        Stage::Metadata,
        Stage::Illustration,
        Stage::Output,
    ];

    /// Percent reported when the stage starts.
    pub fn checkpoint(&self) -> i32 {
        match self {
            Stage::Outline => 10,
            Stage::Research => 25,
            Stage::Draft => 40,
            Stage::Metadata => 60,
            Stage::Illustration => 75,
            Stage::Output => 90,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Outline => "outline",
            Stage::Research => "research",
            Stage::Draft => "draft",
            Stage::Metadata => "metadata",
            Stage::Illustration => "illustration",
            Stage::Output => "output",
        }
    }

    fn start_message(&self) -> &'static str {
        match self {
            Stage::Outline => "Creating content outline...",
            Stage::Research => "Researching topic...",
            Stage::Draft => "Writing content...",
            Stage::Metadata => "Optimizing SEO metadata...",
            Stage::Illustration => "Generating images...",
            Stage::Output => "Saving output...",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Events emitted by the runner, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Started { stage: Stage, message: String },
    Skipped { stage: Stage, message: String },
    Completed { elapsed: Duration },
    Failed { error: String },
}

impl ProgressEvent {
    pub fn started(stage: Stage) -> Self {
        ProgressEvent::Started {
            stage,
            message: stage.start_message().to_string(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ProgressEvent::Started { message, .. } | ProgressEvent::Skipped { message, .. } => {
                message.clone()
            }
            ProgressEvent::Completed { elapsed } => {
                format!("Complete! Generated in {:.1}s", elapsed.as_secs_f64())
            }
            ProgressEvent::Failed { error } => format!("Error: {}", error),
        }
    }

    /// In `[-1, 100]`; -1 marks a failed run.
    pub fn percent(&self) -> i32 {
        match self {
            ProgressEvent::Started { stage, .. } | ProgressEvent::Skipped { stage, .. } => {
                stage.checkpoint()
            }
            ProgressEvent::Completed { .. } => 100,
            ProgressEvent::Failed { .. } => -1,
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Emits each event as a tracing record.
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, event: ProgressEvent) {
        match &event {
            ProgressEvent::Failed { .. } => warn!(percent = -1, "{}", event.message()),
            _ => info!(percent = event.percent(), "{}", event.message()),
        }
    }
}

/// Bridges events onto a broadcast channel for any number of listeners.
pub struct ChannelProgress {
    sender: broadcast::Sender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, event: ProgressEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoints_increase_in_run_order() {
        let checkpoints: Vec<i32> = Stage::ALL.iter().map(Stage::checkpoint).collect();
        assert_eq!(checkpoints, vec![10, 25, 40, 60, 75, 90]);
    }

    #[test]
    fn test_event_messages_and_percent() {
        let started = ProgressEvent::started(Stage::Research);
        assert_eq!(started.message(), "Researching topic...");
        assert_eq!(started.percent(), 25);

        let skipped = ProgressEvent::Skipped {
            stage: Stage::Illustration,
            message: "Skipping image generation...".to_string(),
        };
        assert_eq!(skipped.percent(), 75);

        let done = ProgressEvent::Completed {
            elapsed: Duration::from_millis(12_340),
        };
        assert_eq!(done.message(), "Complete! Generated in 12.3s");
        assert_eq!(done.percent(), 100);

        let failed = ProgressEvent::Failed {
            error: "boom".to_string(),
        };
        assert_eq!(failed.message(), "Error: boom");
        assert_eq!(failed.percent(), -1);
    }

    #[test]
    fn test_channel_progress_delivers_in_order() {
        let progress = ChannelProgress::new(16);
        let mut rx = progress.subscribe();

        progress.report(ProgressEvent::started(Stage::Outline));
        progress.report(ProgressEvent::started(Stage::Research));

        assert_eq!(rx.try_recv().unwrap().percent(), 10);
        assert_eq!(rx.try_recv().unwrap().percent(), 25);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_progress_without_subscribers() {
        let progress = ChannelProgress::new(4);
        progress.report(ProgressEvent::started(Stage::Output));
    }

    #[test]
    fn test_tracing_progress_emits_percent_field() {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Captured {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            TracingProgress.report(ProgressEvent::started(Stage::Draft));
            TracingProgress.report(ProgressEvent::Failed {
                error: "boom".to_string(),
            });
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2, "{}", output);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("percent=40"));
        assert!(lines[0].contains("Writing content..."));
        assert!(lines[1].contains("WARN"));
        assert!(lines[1].contains("percent=-1"));
        assert!(lines[1].contains("Error: boom"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Illustration.to_string(), "illustration");
    }
}
