//! The slice of the consensus engine's contract that the transport depends on.
mod engine;
mod messages;

pub use engine::Peer;
pub use engine::RaftRpcHandler;
pub use engine::Transporter;
pub use messages::AppendEntriesRequest;
pub use messages::AppendEntriesResponse;
pub use messages::LogEntry;
pub use messages::RequestVoteRequest;
pub use messages::RequestVoteResponse;
pub use messages::RpcMessage;
pub use messages::SnapshotPeer;
pub use messages::SnapshotRecoveryRequest;
pub use messages::SnapshotRecoveryResponse;
pub use messages::SnapshotRequest;
pub use messages::SnapshotResponse;
