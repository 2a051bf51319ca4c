//! Local chat front-end for Ollama.
//!
//! A [`ChatService`] keeps one bounded transcript per session (see [`trim`])
//! and streams each reply through a [`Relay`] into whatever [`TokenSink`] the
//! front-end provides. Backend failures never escape the relay; they are
//! shown to the user as a diagnostic message instead.

pub mod args;
mod attachment;
mod backend;
mod chat;
pub mod config;
mod error;
pub mod logger;
mod ollama_backend;
mod relay;
pub mod server;
mod session;
mod sink;
pub mod terminal;
#[cfg(test)]
mod test_helpers;
mod turn;

pub use attachment::{Attachment, IncomingMessage};
pub use backend::{ChatBackend, FragmentStream};
pub use chat::{ChatService, welcome_text};
pub use config::{ChatConfig, GenerationOptions, HistoryPolicy};
pub use error::BackendError;
pub use ollama_backend::OllamaBackend;
pub use relay::{REMEDIATION_HINTS, Relay, RelayState, diagnostic};
pub use session::{SessionId, SessionStore, trim};
pub use sink::{MemorySink, TokenSink};
pub use turn::{ImageRef, Role, Turn};
