use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Connection to host closed")]
    ChannelClosed,
    #[error("Url is invalid")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unexpected frame: {0}")]
    Protocol(String),
    #[error("Host returned error {code}: {message}")]
    Remote { code: String, message: String },
    #[error("Serialization failed")]
    Serialization(#[from] serde_json::Error),
    #[error("Request timed out")]
    Timeout,
    #[error("Websocket transport failed")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}
