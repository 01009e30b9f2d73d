pub mod config;
pub mod error;
pub mod progress;
pub mod runner;
pub mod state;

pub use config::{PipelineConfig, RunOverrides};
pub use error::StageError;
pub use progress::{
    ChannelProgress, NoopProgress, ProgressEvent, ProgressReporter, Stage, TracingProgress,
};
pub use runner::{GenerationResult, GenerationSummary, Generator};
pub use state::{GenerationRequest, PostState, StateDelta};
