use crate::wire::EndpointError;
use std::io;
use tokio::time::Duration;

/// TransportFailure is why an outbound RPC produced no response.
///
/// Callers that only care whether a peer answered can treat every variant the same way.
#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    #[error("Invalid peer address: {0}")]
    InvalidEndpoint(#[from] EndpointError),
    #[error("Failed to encode request: {0}")]
    Encode(#[from] prost::EncodeError),
    #[error("Failed to connect to peer: {0}")]
    Connect(io::Error),
    #[error("Failed to send request: {0}")]
    Send(io::Error),
    #[error("No reply from peer within {0:?}")]
    Timeout(Duration),
    #[error("Failed to receive reply: {0}")]
    Receive(io::Error),
    #[error("Failed to decode reply: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("Snapshot transfer is not supported by this transport")]
    Unsupported,
}
