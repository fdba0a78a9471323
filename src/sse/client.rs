//! Client for the photo event stream endpoint.
//!
//! Opens the backend's `text/event-stream` endpoint, validates the
//! response, and drives the byte stream through [`Utf8Decoder`] and
//! [`FrameParser`] on a background task. The returned
//! [`EventStreamHandle`] hands frames to the caller and owns the
//! connection's lifetime: closing it (or dropping it) cancels the read
//! cleanly rather than erroring.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::sse::decode::Utf8Decoder;
use crate::sse::frame::{FrameParser, SseFrame};

/// Path of the photo event stream, relative to the API base URL.
pub const EVENTS_PATH: &str = "/events/photos";

/// Errors that can occur when connecting to or reading the event stream.
#[derive(Debug)]
pub enum SseError {
    /// Base URL or token missing
    InvalidConfig(String),
    /// Transport-level failure while connecting
    Http(reqwest::Error),
    /// Server answered with a non-success status
    HttpStatus { status: u16, message: String },
    /// Server answered 2xx but not with an event stream
    NotEventStream { content_type: String },
    /// The stream failed after it was established
    Stream(String),
}

impl std::fmt::Display for SseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            SseError::Http(e) => write!(f, "HTTP request failed: {}", e),
            SseError::HttpStatus { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            SseError::NotEventStream { content_type } => {
                write!(f, "Expected an event stream, got '{}'", content_type)
            }
            SseError::Stream(msg) => write!(f, "Event stream failed: {}", msg),
        }
    }
}

impl std::error::Error for SseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SseError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SseError {
    fn from(err: reqwest::Error) -> Self {
        SseError::Http(err)
    }
}

/// Options for a single connection attempt.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Resume cursor; sent as both `Last-Event-ID` and the `since`
    /// query parameter when non-blank
    pub since: Option<String>,
    /// External cancellation; the connection also cancels when this
    /// token does
    pub cancel: Option<CancellationToken>,
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Client for opening photo event stream connections.
#[derive(Debug, Clone)]
pub struct PhotoEventsClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl PhotoEventsClient {
    /// Create a new client for the given base URL and bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a custom reqwest client, e.g. with specific TLS settings.
    ///
    /// The client must not set a read timeout; an idle but healthy
    /// stream only carries heartbeats.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Open the event stream.
    ///
    /// Validates configuration before touching the network, then checks
    /// the response: non-2xx statuses and non-`text/event-stream`
    /// content types are hard errors. On success a background task
    /// starts reading the body and the returned handle yields frames.
    pub async fn connect(&self, options: ConnectOptions) -> Result<EventStreamHandle, SseError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(SseError::InvalidConfig("API base URL is empty".to_string()));
        }
        let token = self.token.trim();
        if token.is_empty() {
            return Err(SseError::InvalidConfig("access token is empty".to_string()));
        }

        let since = options
            .since
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        let mut url = format!("{}{}", base.trim_end_matches('/'), EVENTS_PATH);
        if let Some(cursor) = since {
            url.push_str(&format!("?since={}", urlencoding::encode(cursor)));
        }

        tracing::debug!(url = %url, "connecting to photo event stream");

        let mut request = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "text/event-stream")
            .header("Cache-Control", "no-cache");
        if let Some(cursor) = since {
            request = request.header("Last-Event-ID", cursor);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SseError::HttpStatus {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type
            .to_ascii_lowercase()
            .contains("text/event-stream")
        {
            return Err(SseError::NotEventStream { content_type });
        }

        // A child token keeps external cancellation one-way: cancelling
        // the connection never cancels the caller's token
        let cancel = match options.cancel {
            Some(token) => token.child_token(),
            None => CancellationToken::new(),
        };
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive_stream(response, frame_tx, cancel.clone()));

        Ok(EventStreamHandle {
            frames: frame_rx,
            guard: cancel.clone().drop_guard(),
            cancel,
            driver,
        })
    }
}

/// Handle to a live event stream connection.
///
/// Dropping the handle cancels the connection the same way
/// [`close`](Self::close) does.
pub struct EventStreamHandle {
    frames: mpsc::UnboundedReceiver<SseFrame>,
    cancel: CancellationToken,
    /// Cancels the driver if the handle is dropped without close()
    guard: DropGuard,
    driver: JoinHandle<Result<(), SseError>>,
}

impl EventStreamHandle {
    /// Receive the next parsed frame.
    ///
    /// Returns `None` once the stream has ended for any reason; call
    /// [`closed`](Self::closed) to learn whether the ending was clean.
    pub async fn next_frame(&mut self) -> Option<SseFrame> {
        self.frames.recv().await
    }

    /// Request a clean shutdown of the connection. Safe to call any
    /// number of times, before or after the stream ends.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the connection to settle.
    ///
    /// `Ok(())` when the server closed the stream or the connection was
    /// cancelled; `Err` when the transport failed mid-stream. Consumes
    /// the handle, so the outcome is observed exactly once.
    pub async fn closed(self) -> Result<(), SseError> {
        match self.driver.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(SseError::Stream(format!(
                "stream task failed: {}",
                join_error
            ))),
        }
    }
}

/// Read the response body to completion, parsing frames as bytes arrive.
async fn drive_stream(
    response: reqwest::Response,
    frames: mpsc::UnboundedSender<SseFrame>,
    cancel: CancellationToken,
) -> Result<(), SseError> {
    let mut body = Box::pin(response.bytes_stream());
    let mut decoder = Utf8Decoder::new();
    let mut parser = FrameParser::new();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("photo event stream cancelled");
                return Ok(());
            }
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    let text = decoder.decode(&bytes);
                    for frame in parser.feed(&text) {
                        // Receiver may be gone while we wait for the
                        // server to finish; keep reading regardless
                        let _ = frames.send(frame);
                    }
                }
                Some(Err(e)) => {
                    return Err(SseError::Stream(e.to_string()));
                }
                None => {
                    let tail = decoder.finish();
                    if !tail.is_empty() {
                        for frame in parser.feed(&tail) {
                            let _ = frames.send(frame);
                        }
                    }
                    if let Some(frame) = parser.flush() {
                        let _ = frames.send(frame);
                    }
                    tracing::debug!("photo event stream ended");
                    return Ok(());
                }
            }
        }
    }
}
