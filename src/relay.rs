//! Streams one model reply to a [`TokenSink`].
//!
//! [`Relay::relay`] never fails: a broken backend call is rendered as a
//! diagnostic message which is shown and returned like an ordinary reply, so
//! the caller can record it in the transcript and the session stays usable.

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::backend::ChatBackend;
use crate::config::GenerationOptions;
use crate::error::BackendError;
use crate::sink::TokenSink;
use crate::turn::Turn;

/// Suggestions appended to every diagnostic.
pub const REMEDIATION_HINTS: &str = "Try: (1) ensure Ollama is running, (2) verify the model is pulled, (3) restart the app, or (4) send a shorter message.";

/// Progress of a single relay invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Starting,
    Streaming,
    Completed,
    Failed,
}

/// Text shown in place of a reply when the model call fails.
///
/// ```
/// use hearth::{BackendError, diagnostic};
/// let text = diagnostic("llava", &BackendError::Connection("refused".into()));
/// assert!(text.contains("**Model:** llava"));
/// assert!(text.contains("**Error:** ConnectionError: refused"));
/// ```
pub fn diagnostic(model: &str, err: &BackendError) -> String {
    format!(
        "⚠️ Error calling the local model.\n\n**Model:** {model}\n**Error:** {}: {err}\n\n{REMEDIATION_HINTS}",
        err.category()
    )
}

async fn within<F: Future>(limit: Option<Duration>, fut: F) -> Result<F::Output, BackendError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| BackendError::Timeout(limit)),
        None => Ok(fut.await),
    }
}

/// Drives one model invocation per user turn.
#[derive(Clone)]
pub struct Relay {
    backend: Arc<dyn ChatBackend>,
    options: GenerationOptions,
    idle_timeout: Option<Duration>,
}

impl Relay {
    pub fn new(backend: Arc<dyn ChatBackend>, options: GenerationOptions) -> Self {
        Self {
            backend,
            options,
            idle_timeout: None,
        }
    }

    /// Fail the reply when no fragment arrives within `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        self.backend.model()
    }

    /// Stream a reply to `transcript` into `sink` and return its full text.
    ///
    /// Non-empty fragments are forwarded in arrival order. On failure the
    /// diagnostic from [`diagnostic`] is forwarded as a single fragment and
    /// returned instead.
    pub async fn relay(&self, transcript: &[Turn], sink: &mut dyn TokenSink) -> String {
        match self.stream_into(transcript, sink).await {
            Ok(text) => {
                info!(state = ?RelayState::Completed, bytes = text.len(), "reply finished");
                debug!(response = %text, "llm full response");
                text
            }
            Err(err) => {
                warn!(state = ?RelayState::Failed, category = err.category(), error = %err, "model call failed");
                let text = diagnostic(self.model(), &err);
                sink.stream_token(&text).await;
                text
            }
        }
    }

    async fn stream_into(
        &self,
        transcript: &[Turn],
        sink: &mut dyn TokenSink,
    ) -> Result<String, BackendError> {
        debug!(state = ?RelayState::Starting, model = self.model(), turns = transcript.len(), "calling model");
        let mut stream = within(
            self.idle_timeout,
            self.backend.chat_stream(transcript, &self.options),
        )
        .await??;
        debug!(state = ?RelayState::Streaming, "stream open");

        let mut out = String::new();
        while let Some(fragment) = within(self.idle_timeout, stream.next()).await? {
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            trace!(%fragment, "stream token");
            out.push_str(&fragment);
            sink.stream_token(&fragment).await;
        }
        Ok(out)
    }
}
