use thiserror::Error;

use crate::capability::CapabilityError;
use crate::output::OutputError;

use super::progress::Stage;

/// A failure that ends the run.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{stage} stage failed: {source}")]
    Capability {
        stage: Stage,
        #[source]
        source: CapabilityError,
    },

    #[error("{stage} stage produced no usable output: {reason}")]
    EmptyResponse { stage: Stage, reason: String },

    #[error("Output failed: {0}")]
    Output(#[from] OutputError),

    #[error("{destination} output failed: {message}")]
    OutputRejected {
        destination: String,
        message: String,
    },
}

impl StageError {
    pub fn capability(stage: Stage) -> impl FnOnce(CapabilityError) -> Self {
        move |source| StageError::Capability { stage, source }
    }
}
