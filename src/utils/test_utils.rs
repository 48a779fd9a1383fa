use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use crate::api::{InferenceBackend, InferenceError};
use crate::core::submission::{Attachment, PendingSubmission, SubmissionPayload};

pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client")
}

pub fn leaf_attachment() -> Attachment {
    Attachment {
        file_name: "leaf.png".to_string(),
        mime_type: "image/png",
        bytes: b"\x89PNG\r\n\x1a\nfake".to_vec(),
    }
}

pub fn leaf_payload(question: Option<&str>) -> SubmissionPayload {
    let pending = PendingSubmission {
        question: question.unwrap_or_default().to_string(),
        attachment: Some(leaf_attachment()),
    };
    SubmissionPayload::from_pending(1, pending)
}

#[derive(Debug)]
pub struct CapturedRequest {
    pub path: String,
    pub headers: String,
    pub body: Vec<u8>,
}

/// Minimal HTTP/1.1 responder bound to a random local port. Every request
/// gets the same canned status and body.
pub struct StubServer {
    base: String,
    requests: mpsc::UnboundedReceiver<CapturedRequest>,
}

impl StubServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn next_request(&mut self) -> CapturedRequest {
        tokio::time::timeout(Duration::from_secs(5), self.requests.recv())
            .await
            .expect("stub server saw no request")
            .expect("stub server stopped")
    }
}

pub async fn spawn_stub_server(
    status: u16,
    body: &'static str,
    delay: Option<Duration>,
) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = serve_one(stream, status, body, delay, tx).await;
            });
        }
    });

    StubServer {
        base: format!("http://{addr}"),
        requests: rx,
    }
}

async fn serve_one(
    mut stream: TcpStream,
    status: u16,
    body: &'static str,
    delay: Option<Duration>,
    tx: mpsc::UnboundedSender<CapturedRequest>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..read]);
        if let Some(pos) = memchr::memmem::find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let lower = headers.to_ascii_lowercase();
    let content_length = lower
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());
    let chunked = lower.contains("transfer-encoding: chunked");

    loop {
        let received = buf.len() - header_end;
        let complete = match content_length {
            Some(length) => received >= length,
            None if chunked => buf.ends_with(b"0\r\n\r\n"),
            None => true,
        };
        if complete {
            break;
        }
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..read]);
    }

    let path = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let _ = tx.send(CapturedRequest {
        path,
        headers,
        body: buf[header_end..].to_vec(),
    });

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let reason = if (200..300).contains(&status) {
        "OK"
    } else {
        "Error"
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

/// Backend whose replies are released by the test, one request id at a
/// time, so arrival order can be chosen independently of submission order.
#[derive(Default)]
pub struct ScriptedBackend {
    gates: Mutex<HashMap<u64, oneshot::Sender<Result<String, String>>>>,
    waiting: Mutex<HashMap<u64, oneshot::Receiver<Result<String, String>>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called before the request with this id is issued.
    pub fn expect(&self, request_id: u64) {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(request_id, tx);
        self.waiting.lock().unwrap().insert(request_id, rx);
    }

    pub fn reply(&self, request_id: u64, text: &str) {
        self.release(request_id, Ok(text.to_string()));
    }

    pub fn fail(&self, request_id: u64) {
        self.release(request_id, Err("connection reset".to_string()));
    }

    fn release(&self, request_id: u64, outcome: Result<String, String>) {
        let gate = self
            .gates
            .lock()
            .unwrap()
            .remove(&request_id)
            .expect("request id was not expected");
        let _ = gate.send(outcome);
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn infer(&self, payload: &SubmissionPayload) -> Result<String, InferenceError> {
        let rx = self
            .waiting
            .lock()
            .unwrap()
            .remove(&payload.request_id)
            .expect("request id was not expected");
        match rx.await {
            Ok(Ok(text)) => Ok(text),
            _ => Err(InferenceError::Status {
                endpoint: "scripted".to_string(),
                status: reqwest::StatusCode::BAD_GATEWAY,
                body: "scripted failure".to_string(),
            }),
        }
    }
}
