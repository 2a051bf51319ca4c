use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single model invocation.
///
/// Every cause of a failed or aborted chat request ends up here. The relay
/// turns it into a diagnostic shown to the user instead of propagating it.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The model server could not be reached.
    #[error("{0}")]
    Connection(String),
    /// The server does not know the requested model.
    #[error("{0}")]
    ModelNotFound(String),
    /// The server answered with something that is not a chat chunk.
    #[error("{0}")]
    MalformedResponse(String),
    /// No fragment arrived within the configured idle timeout.
    #[error("no response from the model within {}s", .0.as_secs_f32())]
    Timeout(Duration),
    /// An attached image could not be read.
    #[error("could not read image {}: {reason}", .path.display())]
    Image { path: PathBuf, reason: String },
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Short label naming the kind of failure.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "ConnectionError",
            Self::ModelNotFound(_) => "ModelNotFound",
            Self::MalformedResponse(_) => "MalformedResponse",
            Self::Timeout(_) => "Timeout",
            Self::Image { .. } => "ImageError",
            Self::Other(_) => "BackendError",
        }
    }
}
