use std::time::Duration;

use shared::error::ProtocolError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::connection::ConnectionPhase;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid endpoint url '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("failed to connect websocket: {endpoint}: {source}")]
    Open {
        endpoint: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
    #[error("timed out after {timeout:?} connecting websocket: {endpoint}")]
    Timeout { endpoint: String, timeout: Duration },
    #[error("connection attempt to {endpoint} was cancelled")]
    Cancelled { endpoint: String },
    #[error("connection is busy ({0:?}); end the session before starting a new one")]
    Busy(ConnectionPhase),
    #[error("websocket send failed: {0}")]
    Send(#[source] Box<tungstenite::Error>),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Debug, Error)]
pub enum FrameDecodeError {
    #[error("failed to decode image frame: {0}")]
    Image(#[from] image::ImageError),
    #[error("image decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("canvas is empty; nothing to export")]
    EmptyCanvas,
    #[error("failed to create export directory '{path}': {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write image: {0}")]
    Write(#[from] image::ImageError),
}
