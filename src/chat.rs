use std::sync::Arc;

use crate::attachment::IncomingMessage;
use crate::backend::ChatBackend;
use crate::config::ChatConfig;
use crate::relay::Relay;
use crate::session::{SessionId, SessionStore};
use crate::sink::TokenSink;
use crate::turn::Turn;

/// Banner greeting every new session.
pub fn welcome_text(model: &str) -> String {
    format!(
        "Hello! I’m your **100% local** ChatGPT-style assistant running on **{model}**.\nSend a message (and optionally an image) to get started."
    )
}

/// Message handling shared by every front-end.
///
/// Owns the session transcripts and the relay. Front-ends call
/// [`ChatService::start_session`] once per user and then
/// [`ChatService::handle_message`] for each message, one at a time per
/// session.
pub struct ChatService {
    sessions: SessionStore,
    relay: Relay,
}

impl ChatService {
    pub fn new(config: &ChatConfig, backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            sessions: SessionStore::new(config.history.clone()),
            relay: Relay::new(backend, config.generation).with_idle_timeout(config.stream_timeout),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn model(&self) -> &str {
        self.relay.model()
    }

    /// Type the welcome banner into `sink` one character at a time.
    pub async fn welcome(&self, sink: &mut dyn TokenSink) {
        let mut buf = [0u8; 4];
        for ch in welcome_text(self.model()).chars() {
            sink.stream_token(ch.encode_utf8(&mut buf)).await;
            tokio::task::yield_now().await;
        }
        sink.send().await;
    }

    /// Open a new session and greet the user.
    pub async fn start_session(&self, sink: &mut dyn TokenSink) -> SessionId {
        let id = SessionId::new();
        self.sessions.ensure_session(id).await;
        tracing::info!(session = %id, model = self.model(), "chat started");
        self.welcome(sink).await;
        id
    }

    /// Answer `message` in session `id`, streaming the reply into `sink`.
    ///
    /// Returns the assistant text that was recorded, which is a diagnostic
    /// message when the model call failed.
    pub async fn handle_message(
        &self,
        id: SessionId,
        message: IncomingMessage,
        sink: &mut dyn TokenSink,
    ) -> String {
        self.sessions.ensure_session(id).await;
        let mut transcript = self.sessions.trim(&self.sessions.transcript(id).await);

        let images = message.image_refs();
        tracing::debug!(session = %id, images = images.len(), "user message");
        transcript.push(Turn::user_with_images(message.content, images));

        let reply = self.relay.relay(&transcript, sink).await;
        transcript.push(Turn::assistant(reply.clone()));

        self.sessions
            .store(id, self.sessions.trim(&transcript))
            .await;
        sink.send().await;
        reply
    }

    /// Drop the session's transcript.
    pub async fn end_session(&self, id: SessionId) {
        self.sessions.end_session(id).await;
    }
}
