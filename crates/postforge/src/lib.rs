pub mod capability;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod queue;
pub mod sanitize;
pub mod secrets;
pub mod stages;
pub mod storage;
pub mod telemetry;

pub use capability::{
    Capabilities, CapabilityError, ImageGenerator, PromptRequest, SearchProvider, SearchQuery,
    SearchResult, TextGenerator,
};
pub use config::{load_config, Config, Destination, DestinationKind, SiteConfig};
pub use error::{ConfigError, PostforgeError, QueueError, Result, StorageError};
pub use output::{OutputError, OutputResult};
pub use pipeline::{
    GenerationResult, GenerationSummary, Generator, PipelineConfig, PostState, ProgressEvent,
    ProgressReporter, RunOverrides, Stage,
};
pub use queue::{QueueItem, QueueStatus, QueueStore, RunOutcome, TopicQueue};
pub use secrets::{SecretError, SecretSource};
