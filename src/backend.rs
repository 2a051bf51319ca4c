use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::GenerationOptions;
use crate::error::BackendError;
use crate::turn::Turn;

/// Text fragments produced by a model, in generation order.
///
/// An `Err` item means the stream broke off; nothing follows it.
pub type FragmentStream = BoxStream<'static, Result<String, BackendError>>;

/// Common interface for chat models.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Identifier of the model this backend talks to.
    fn model(&self) -> &str;

    /// Start generating a reply to `transcript`.
    async fn chat_stream(
        &self,
        transcript: &[Turn],
        options: &GenerationOptions,
    ) -> Result<FragmentStream, BackendError>;
}
