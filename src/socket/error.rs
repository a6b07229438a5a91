#[derive(Debug, thiserror::Error)]
pub(crate) enum SocketError {
    #[error("Socket is closed")]
    Closed,
    #[error("No request is waiting for a reply")]
    NoPendingRequest,
}
