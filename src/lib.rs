mod logging;
mod raft;
mod socket;
mod transport;
mod wire;

pub use logging::create_root_logger_for_stdout;
pub use logging::discard_logger;
pub use raft::AppendEntriesRequest;
pub use raft::AppendEntriesResponse;
pub use raft::LogEntry;
pub use raft::Peer;
pub use raft::RaftRpcHandler;
pub use raft::RequestVoteRequest;
pub use raft::RequestVoteResponse;
pub use raft::RpcMessage;
pub use raft::SnapshotPeer;
pub use raft::SnapshotRecoveryRequest;
pub use raft::SnapshotRecoveryResponse;
pub use raft::SnapshotRequest;
pub use raft::SnapshotResponse;
pub use raft::Transporter;
pub use transport::IllegalOptions;
pub use transport::InboundServer;
pub use transport::InstallError;
pub use transport::MessageTransporter;
pub use transport::TransportFailure;
pub use transport::TransportOptions;
pub use wire::Endpoint;
pub use wire::EndpointError;
pub use wire::MessageTag;

// `crate::{root_mod}` holds only `mod` and `pub use` statements. Modules are never `pub`; types
// are exported individually from here.
