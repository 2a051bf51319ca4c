use async_trait::async_trait;
use base64::{Engine, engine::general_purpose};
use futures::{StreamExt, future, stream};
use ollama_rs::{
    Ollama,
    error::OllamaError,
    generation::chat::{ChatMessage, ChatMessageResponseStream, request::ChatMessageRequest},
    generation::images::Image,
    models::ModelOptions,
};
use reqwest::Client;
use serde::Deserialize;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use url::Url;

use crate::backend::{ChatBackend, FragmentStream};
use crate::config::{ChatConfig, GenerationOptions};
use crate::error::BackendError;
use crate::turn::{ImageRef, Turn};

/// Build an [`Ollama`] client for `base`, e.g. `http://localhost:11434`.
fn build_ollama(client: Client, base: &str) -> anyhow::Result<Ollama> {
    let url = Url::parse(base)?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("no host in {base}"))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| anyhow::anyhow!("no port in {base}"))?;
    Ok(Ollama::new_with_client(
        format!("{}://{}", url.scheme(), host),
        port,
        client,
    ))
}

/// Read and base64-encode an attached image.
async fn load_image(image: &ImageRef) -> Result<Image, BackendError> {
    let bytes = tokio::fs::read(image.path())
        .await
        .map_err(|e| BackendError::Image {
            path: image.path().to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(Image::from_base64(general_purpose::STANDARD.encode(bytes)))
}

async fn to_chat_message(turn: &Turn) -> Result<ChatMessage, BackendError> {
    Ok(match turn {
        Turn::System { content } => ChatMessage::system(content.clone()),
        Turn::Assistant { content } => ChatMessage::assistant(content.clone()),
        Turn::User { content, images } if images.is_empty() => ChatMessage::user(content.clone()),
        Turn::User { content, images } => {
            let mut encoded = Vec::with_capacity(images.len());
            for image in images {
                encoded.push(load_image(image).await?);
            }
            ChatMessage::user(content.clone()).with_images(encoded)
        }
    })
}

/// Build a chat request for the given model, transcript and options.
async fn build_request(
    model: &str,
    transcript: &[Turn],
    options: &GenerationOptions,
) -> Result<ChatMessageRequest, BackendError> {
    let mut messages = Vec::with_capacity(transcript.len());
    for turn in transcript {
        messages.push(to_chat_message(turn).await?);
    }
    Ok(
        ChatMessageRequest::new(model.to_string(), messages).options(
            ModelOptions::default()
                .temperature(options.temperature)
                .top_p(options.top_p)
                .num_predict(options.num_predict),
        ),
    )
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Sort an [`OllamaError`] into a [`BackendError`] category.
fn classify(err: OllamaError) -> BackendError {
    match err {
        OllamaError::ReqwestError(e) if e.is_connect() => BackendError::Connection(e.to_string()),
        OllamaError::ReqwestError(e) if e.is_decode() => {
            BackendError::MalformedResponse(e.to_string())
        }
        OllamaError::ReqwestError(e) => BackendError::Other(e.to_string()),
        OllamaError::JsonError(e) => BackendError::MalformedResponse(e.to_string()),
        OllamaError::Other(body) => {
            let msg = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            if msg.contains("not found") {
                BackendError::ModelNotFound(msg)
            } else if msg.trim().is_empty() {
                BackendError::MalformedResponse("empty error response".into())
            } else {
                BackendError::Other(msg)
            }
        }
        other => BackendError::Other(other.to_string()),
    }
}

/// Map an Ollama response stream into a [`FragmentStream`].
///
/// Ollama reports errors during generation as lines the client skips, so a
/// stream that ends without a `done` chunk is treated as failed.
fn map_stream(responses: ChatMessageResponseStream) -> FragmentStream {
    let done = Arc::new(AtomicBool::new(false));
    let seen = done.clone();
    let mapped = responses.map(move |res| match res {
        Ok(resp) => {
            if resp.done {
                seen.store(true, Ordering::Relaxed);
            }
            let tok = resp.message.content;
            tracing::trace!(%tok, "llm token");
            Ok(tok)
        }
        Err(e) => {
            tracing::error!(?e, "ollama stream error");
            Err(BackendError::MalformedResponse(format!(
                "could not decode stream chunk: {e:?}"
            )))
        }
    });
    let tail = stream::once(async move {
        if done.load(Ordering::Relaxed) {
            None
        } else {
            tracing::warn!("ollama stream ended before completion");
            Some(Err(BackendError::MalformedResponse(
                "stream ended before completion".into(),
            )))
        }
    })
    .filter_map(future::ready);
    Box::pin(mapped.chain(tail))
}

/// [`ChatBackend`] implementation backed by [`Ollama`].
#[derive(Clone)]
pub struct OllamaBackend {
    client: Ollama,
    model: String,
}

impl OllamaBackend {
    /// Creates a new Ollama-backed client.
    pub fn new(client: Ollama, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Creates a client for the server and model named in `config`.
    pub fn connect(config: &ChatConfig) -> anyhow::Result<Self> {
        let http = Client::builder().pool_max_idle_per_host(10).build()?;
        Ok(Self::new(
            build_ollama(http, &config.llm_url)?,
            config.model.clone(),
        ))
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat_stream(
        &self,
        transcript: &[Turn],
        options: &GenerationOptions,
    ) -> Result<FragmentStream, BackendError> {
        let req = build_request(&self.model, transcript, options).await?;
        let stream = self
            .client
            .send_chat_messages_stream(req)
            .await
            .map_err(classify)?;
        Ok(map_stream(stream))
    }
}
