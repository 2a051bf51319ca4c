use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use futures::SinkExt;
use hearth::{
    BackendError, ChatBackend, ChatConfig, ChatService, FragmentStream, GenerationOptions, Turn,
    server, welcome_text,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Echoes the last user turn back in two fragments.
struct EchoBackend;

#[async_trait]
impl ChatBackend for EchoBackend {
    fn model(&self) -> &str {
        "echo"
    }

    async fn chat_stream(
        &self,
        transcript: &[Turn],
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, BackendError> {
        let last = transcript.last().map(|t| t.content().to_string()).unwrap_or_default();
        let fragments: Vec<Result<String, BackendError>> = vec![Ok("you said: ".into()), Ok(last)];
        Ok(stream::iter(fragments).boxed())
    }
}

async fn start_server(service: Arc<ChatService>) -> std::net::SocketAddr {
    let app = server::router(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

async fn next_frame(ws: &mut Client) -> Value {
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            _ => continue,
        }
    }
}

/// Collect token frames until the end frame, returning the joined text.
async fn read_message(ws: &mut Client) -> (String, usize) {
    let mut text = String::new();
    let mut frames = 0;
    loop {
        let frame = next_frame(ws).await;
        match frame["type"].as_str().unwrap() {
            "token" => {
                text.push_str(frame["text"].as_str().unwrap());
                frames += 1;
            }
            "end" => return (text, frames),
            other => panic!("unexpected frame {other}"),
        }
    }
}

#[tokio::test]
async fn streams_welcome_and_replies() {
    let service = Arc::new(ChatService::new(&ChatConfig::default(), Arc::new(EchoBackend)));
    let addr = start_server(service.clone()).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();

    let (welcome, frames) = read_message(&mut ws).await;
    assert_eq!(welcome, welcome_text("echo"));
    assert_eq!(frames, welcome.chars().count());

    ws.send(Message::Text(json!({"content": "hi"}).to_string()))
        .await
        .unwrap();
    let (reply, frames) = read_message(&mut ws).await;
    assert_eq!(reply, "you said: hi");
    assert_eq!(frames, 2);
    assert_eq!(service.sessions().len().await, 1);
}

#[tokio::test]
async fn bad_frame_is_answered_with_error() {
    let service = Arc::new(ChatService::new(&ChatConfig::default(), Arc::new(EchoBackend)));
    let addr = start_server(service.clone()).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    read_message(&mut ws).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame["type"], "error");

    ws.send(Message::Text(json!({"content": "still here"}).to_string()))
        .await
        .unwrap();
    let (reply, _) = read_message(&mut ws).await;
    assert_eq!(reply, "you said: still here");
}

#[tokio::test]
async fn disconnect_ends_session() {
    let service = Arc::new(ChatService::new(&ChatConfig::default(), Arc::new(EchoBackend)));
    let addr = start_server(service.clone()).await;
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    read_message(&mut ws).await;
    assert_eq!(service.sessions().len().await, 1);

    ws.close(None).await.unwrap();
    for _ in 0..50 {
        if service.sessions().is_empty().await {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("session was not dropped");
}
