use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to encode control message: {0}")]
    Encode(#[source] serde_json::Error),
}
