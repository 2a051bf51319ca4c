use async_trait::async_trait;

/// Surface that renders an assistant message while it is being generated.
///
/// Front-ends implement this for whatever they display on. Delivery problems
/// (a closed socket, a broken pipe) are handled and logged by the
/// implementation; generation carries on regardless.
#[async_trait]
pub trait TokenSink: Send {
    /// Append `text` to the message currently on display.
    async fn stream_token(&mut self, text: &str);

    /// Finalize the current message.
    async fn send(&mut self);
}

/// Sink that keeps everything in memory, one entry per finished message.
///
/// Useful for driving a [`crate::ChatService`] without a real front-end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySink {
    /// Every fragment received, in arrival order.
    pub fragments: Vec<String>,
    /// Messages finalized with [`TokenSink::send`].
    pub messages: Vec<String>,
    current: String,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the message in progress.
    pub fn pending(&self) -> &str {
        &self.current
    }
}

#[async_trait]
impl TokenSink for MemorySink {
    async fn stream_token(&mut self, text: &str) {
        self.fragments.push(text.to_string());
        self.current.push_str(text);
    }

    async fn send(&mut self) {
        self.messages.push(std::mem::take(&mut self.current));
    }
}
