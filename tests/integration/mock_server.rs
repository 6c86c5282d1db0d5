//! Mock HTTP server setup for integration tests

use mockito::{Matcher, Mock, Server, ServerGuard};
use std::time::Duration;
use textgen_client::{ClientBuilder, GenerationClient, ModelSelectionPolicy};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const GENERATE_PATH: &str = "/api/generate";
pub const TAGS_PATH: &str = "/api/tags";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Builder pointed at the mock server, with retries off and short delays.
    pub fn builder(&self) -> ClientBuilder {
        fast_builder(&self.base_url)
    }

    pub fn client(&self) -> GenerationClient {
        self.builder().build().expect("client")
    }

    /// `POST /api/generate` answering with `status` and a JSON body.
    pub async fn mock_generate(&mut self, status: usize, body: &str) -> Mock {
        self.mock_generate_expecting(status, body, 1).await
    }

    /// Like [`Self::mock_generate`], asserting exactly `hits` requests.
    pub async fn mock_generate_expecting(&mut self, status: usize, body: &str, hits: usize) -> Mock {
        self.server
            .mock("POST", GENERATE_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({ "stream": false })))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    /// `POST /api/generate` with `stream: true`, answering with one NDJSON line per entry.
    pub async fn mock_ndjson_stream(&mut self, lines: &[&str]) -> Mock {
        let body: String = lines.iter().map(|l| format!("{l}\n")).collect();
        self.server
            .mock("POST", GENERATE_PATH)
            .match_body(Matcher::PartialJson(serde_json::json!({ "stream": true })))
            .with_status(200)
            .with_header("content-type", "application/x-ndjson")
            .with_body(body)
            .create_async()
            .await
    }

    /// `GET /api/tags`
    pub async fn mock_tags(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("GET", TAGS_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}

pub fn fast_builder(base_url: &str) -> ClientBuilder {
    GenerationClient::builder()
        .base_url(base_url)
        .timeout(Duration::from_secs(5))
        .connect_timeout(Duration::from_secs(2))
        .max_retry_attempts(0)
        .retry_delay(Duration::from_millis(10))
        .model_policy(ModelSelectionPolicy::default())
}

/// A server that accepts connections and never answers.
pub async fn silent_server() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    (format!("http://{addr}"), handle)
}

/// A server that answers with a chunked NDJSON head and the given lines, then stalls.
pub async fn stalling_stream_server(lines: &'static [&'static str]) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut buf = vec![0u8; 8192];
        let _ = socket.read(&mut buf).await;

        let mut out = String::from(
            "HTTP/1.1 200 OK\r\ncontent-type: application/x-ndjson\r\ntransfer-encoding: chunked\r\n\r\n",
        );
        for line in lines {
            let data = format!("{line}\n");
            out.push_str(&format!("{:x}\r\n{}\r\n", data.len(), data));
        }
        if socket.write_all(out.as_bytes()).await.is_err() {
            return;
        }
        let _ = socket.flush().await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });
    (format!("http://{addr}"), handle)
}

/// Base URL of a port nobody listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{addr}")
}
