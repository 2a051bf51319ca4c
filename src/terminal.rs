//! Interactive chat on a terminal.
//!
//! Each input line is one message. `/image <path>` attaches a file to the next
//! message and `/quit` ends the session.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::attachment::{Attachment, IncomingMessage};
use crate::chat::ChatService;
use crate::sink::TokenSink;

/// [`TokenSink`] writing straight to a terminal or any other writer.
pub struct TerminalSink<W> {
    out: W,
}

impl<W: AsyncWrite + Unpin + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    async fn write(&mut self, text: &str) {
        let res = async {
            self.out.write_all(text.as_bytes()).await?;
            self.out.flush().await
        }
        .await;
        if let Err(e) = res {
            tracing::warn!(error = %e, "terminal write failed");
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> TokenSink for TerminalSink<W> {
    async fn stream_token(&mut self, text: &str) {
        self.write(text).await;
    }

    async fn send(&mut self) {
        self.write("\n\n").await;
    }
}

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Message(String),
    Attach(Attachment),
    Quit,
    Blank,
    Usage(&'static str),
}

fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Blank
    } else if trimmed == "/quit" {
        Input::Quit
    } else if trimmed == "/image" {
        Input::Usage("usage: /image <path>")
    } else if let Some(path) = trimmed.strip_prefix("/image ") {
        Input::Attach(Attachment::from_path(path.trim()))
    } else {
        Input::Message(line.to_string())
    }
}

/// Run one chat session reading from `input` and writing to `output`.
///
/// ```no_run
/// use std::sync::Arc;
/// use hearth::{ChatConfig, ChatService, OllamaBackend, terminal};
/// use tokio::io::{BufReader, stdin, stdout};
/// # async fn example() -> anyhow::Result<()> {
/// let config = ChatConfig::default();
/// let service = ChatService::new(&config, Arc::new(OllamaBackend::connect(&config)?));
/// terminal::run(&service, BufReader::new(stdin()), stdout()).await?;
/// # Ok(()) }
/// ```
pub async fn run<R, W>(service: &ChatService, input: R, output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    let mut sink = TerminalSink::new(output);
    let id = service.start_session(&mut sink).await;
    let mut lines = input.lines();
    let mut pending = Vec::new();

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Input::Blank => {}
            Input::Quit => break,
            Input::Usage(hint) => sink.write(&format!("({hint})\n")).await,
            Input::Attach(attachment) => {
                if !attachment.is_image() {
                    sink.write("(not an image, ignored)\n").await;
                } else if let Some(path) = &attachment.path {
                    sink.write(&format!("(attached {})\n", path.display()))
                        .await;
                }
                pending.push(attachment);
            }
            Input::Message(content) => {
                let message = IncomingMessage {
                    content,
                    elements: std::mem::take(&mut pending),
                };
                service.handle_message(id, message, &mut sink).await;
            }
        }
    }

    service.end_session(id).await;
    sink.into_inner().flush().await?;
    Ok(())
}
