#![cfg(test)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};

use crate::backend::{ChatBackend, FragmentStream};
use crate::config::GenerationOptions;
use crate::error::BackendError;
use crate::turn::Turn;

/// [`ChatBackend`] that replies with a fixed list of fragments and records
/// every transcript it is called with.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    pub fragments: Vec<String>,
    pub stall: bool,
    pub calls: Arc<Mutex<Vec<Vec<Turn>>>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Emit the fragments, then never finish.
    pub fn stalled<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stall: true,
            ..Self::new(fragments)
        }
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn chat_stream(
        &self,
        transcript: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, BackendError> {
        self.calls.lock().unwrap().push(transcript.to_vec());
        let head = stream::iter(
            self.fragments
                .clone()
                .into_iter()
                .map(Ok::<String, BackendError>),
        );
        if self.stall {
            Ok(head.chain(stream::pending()).boxed())
        } else {
            Ok(head.boxed())
        }
    }
}

/// [`ChatBackend`] that fails either when called or after some fragments.
pub enum FailingBackend {
    AtStart(String),
    After(Vec<String>),
}

impl FailingBackend {
    pub fn at_start(model: &str) -> Self {
        FailingBackend::AtStart(model.to_string())
    }

    pub fn after<const N: usize>(fragments: [&str; N]) -> Self {
        FailingBackend::After(fragments.iter().map(|s| s.to_string()).collect())
    }
}

#[async_trait]
impl ChatBackend for FailingBackend {
    fn model(&self) -> &str {
        match self {
            FailingBackend::AtStart(model) => model,
            FailingBackend::After(_) => "failing",
        }
    }

    async fn chat_stream(
        &self,
        _transcript: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, BackendError> {
        match self {
            FailingBackend::AtStart(_) => Err(BackendError::Connection(
                "connection refused".into(),
            )),
            FailingBackend::After(fragments) => {
                let items = fragments
                    .clone()
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(BackendError::MalformedResponse(
                        "truncated chunk".into(),
                    ))));
                Ok(stream::iter(items).boxed())
            }
        }
    }
}

/// [`ChatBackend`] whose call never returns a stream.
pub struct HangingBackend;

#[async_trait]
impl ChatBackend for HangingBackend {
    fn model(&self) -> &str {
        "hanging"
    }

    async fn chat_stream(
        &self,
        _transcript: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, BackendError> {
        futures::future::pending().await
    }
}
