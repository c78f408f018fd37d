use thiserror::Error;

/// Failures inside the bridge.  None of these are fatal: each call site
/// decides whether to retry, invalidate derived state, or alert a button.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("websocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected http status {0}")]
    Status(reqwest::StatusCode),

    #[error("empty response body")]
    EmptyBody,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] anyhow::Error),

    #[error("engine channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
