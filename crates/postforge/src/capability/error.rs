use thiserror::Error;

/// Failure modes shared by every capability port.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Quota exceeded: {0}")]
    Quota(String),

    #[error("Upstream returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request refused: {0}")]
    Refused(String),

    #[error("Capability not configured: {0}")]
    NotConfigured(String),
}

impl CapabilityError {
    pub fn from_reqwest(context: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CapabilityError::Timeout(format!("{}: {}", context, e))
        } else if e.is_decode() {
            CapabilityError::MalformedResponse(format!("{}: {}", context, e))
        } else {
            CapabilityError::Transport(format!("{}: {}", context, e))
        }
    }
}

pub type Result<T> = std::result::Result<T, CapabilityError>;
