use async_trait::async_trait;
use axum::{
    Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;

use crate::attachment::IncomingMessage;
use crate::chat::ChatService;
use crate::sink::TokenSink;

/// Frame sent from the server to a chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Text to append to the message on display.
    Token { text: String },
    /// The message on display is complete.
    End,
    /// A client frame could not be understood.
    Error { message: String },
}

/// [`TokenSink`] forwarding fragments over a WebSocket as [`ServerFrame`]s.
struct WsSink<'a> {
    socket: &'a mut WebSocket,
    open: bool,
}

impl<'a> WsSink<'a> {
    fn new(socket: &'a mut WebSocket) -> Self {
        Self { socket, open: true }
    }

    async fn push(&mut self, frame: ServerFrame) {
        if !self.open {
            return;
        }
        let text = match serde_json::to_string(&frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode frame");
                return;
            }
        };
        if self.socket.send(Message::Text(text)).await.is_err() {
            tracing::debug!("client went away");
            self.open = false;
        }
    }
}

#[async_trait]
impl TokenSink for WsSink<'_> {
    async fn stream_token(&mut self, text: &str) {
        self.push(ServerFrame::Token {
            text: text.to_string(),
        })
        .await;
    }

    async fn send(&mut self) {
        self.push(ServerFrame::End).await;
    }
}

/// Build a router exposing the chat WebSocket endpoint at `/ws`.
pub fn router(service: Arc<ChatService>) -> Router {
    Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let service = service.clone();
            async move { ws.on_upgrade(move |socket| session(service, socket)) }
        }),
    )
}

/// Serve the chat router on `host:port` until the process stops.
pub async fn serve(service: Arc<ChatService>, host: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "serving chat");
    axum::serve(listener, router(service)).await?;
    Ok(())
}

/// One connection is one session; messages are answered strictly in order.
async fn session(service: Arc<ChatService>, mut socket: WebSocket) {
    let id = service.start_session(&mut WsSink::new(&mut socket)).await;

    while let Some(Ok(msg)) = socket.recv().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let mut sink = WsSink::new(&mut socket);
        match serde_json::from_str::<IncomingMessage>(&text) {
            Ok(message) => {
                service.handle_message(id, message, &mut sink).await;
            }
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "bad client frame");
                sink.push(ServerFrame::Error {
                    message: e.to_string(),
                })
                .await;
            }
        }
        if !sink.open {
            break;
        }
    }

    service.end_session(id).await;
}
