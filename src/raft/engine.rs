use crate::raft::messages::{
    AppendEntriesRequest, AppendEntriesResponse, RequestVoteRequest, RequestVoteResponse, SnapshotRecoveryRequest,
    SnapshotRecoveryResponse, SnapshotRequest, SnapshotResponse,
};
use crate::transport::TransportFailure;

/// Peer is a remote replica as the consensus engine knows it. The transport only needs the
/// connection string and never remembers peers between calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Peer {
    pub name: String,
    // Messaging endpoint, e.g. `tcp://10.0.0.2:5555`. Not the HTTP address.
    pub connection_string: String,
}

impl Peer {
    pub fn new(name: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Peer {
            name: name.into(),
            connection_string: connection_string.into(),
        }
    }
}

/// RaftRpcHandler is the local consensus engine as seen by the inbound server. Every decoded
/// request is handed to it and whatever it returns is sent back to the caller.
#[async_trait::async_trait]
pub trait RaftRpcHandler: Send + Sync + 'static {
    async fn request_vote(&self, request: RequestVoteRequest) -> RequestVoteResponse;

    async fn append_entries(&self, request: AppendEntriesRequest) -> AppendEntriesResponse;
}

/// Transporter is what the consensus engine calls to reach its peers.
///
/// Any `Err` means "no answer this round". The engine re-issues RPCs on its own election and
/// heartbeat schedule, so implementations must not retry.
#[async_trait::async_trait]
pub trait Transporter: Send + Sync {
    async fn send_vote_request(
        &self,
        peer: &Peer,
        request: &RequestVoteRequest,
    ) -> Result<RequestVoteResponse, TransportFailure>;

    async fn send_append_entries_request(
        &self,
        peer: &Peer,
        request: &AppendEntriesRequest,
    ) -> Result<AppendEntriesResponse, TransportFailure>;

    async fn send_snapshot_request(
        &self,
        peer: &Peer,
        request: &SnapshotRequest,
    ) -> Result<SnapshotResponse, TransportFailure>;

    async fn send_snapshot_recovery_request(
        &self,
        peer: &Peer,
        request: &SnapshotRecoveryRequest,
    ) -> Result<SnapshotRecoveryResponse, TransportFailure>;
}
