#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use reqwest::Client;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use tutor_server::app::{build_router, cors_layer};
use tutor_server::relay::Relay;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A server bound to an ephemeral local port for the duration of one test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub relay: Arc<Relay>,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let relay = Arc::new(Relay::in_memory());
        let app = build_router(relay.clone(), cors_layer(None).unwrap());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, relay, handle }
    }

    /// Build a URL for an API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect_ws(&self) -> WsStream {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("Failed to open websocket");
        ws
    }

    /// Create a session over HTTP and return its id.
    pub async fn create_session(&self, client: &Client) -> String {
        let resp = client
            .post(self.url("/api/session"))
            .send()
            .await
            .expect("Failed to send create request");
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["sessionId"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn send_event(ws: &mut WsStream, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("Failed to send event");
}

/// Next JSON event on the socket, skipping control frames.
pub async fn recv_event(ws: &mut WsStream) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("Timed out waiting for event");
        match frame {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("Socket closed while waiting for event: {other:?}"),
        }
    }
}
