//! Consensus RPC payloads.
//!
//! These mirror the protobuf messages the consensus engine exchanges between replicas. The
//! transport never looks inside them; it only moves the encoded bytes.
use bytes::{Bytes, BytesMut};

/// Encode/decode helpers shared by every RPC payload.
pub trait RpcMessage: prost::Message + Default + Sized {
    fn encode_to_bytes(&self) -> Result<Bytes, prost::EncodeError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        prost::Message::encode(self, &mut buf)?;
        Ok(buf.freeze())
    }

    /// An empty buffer decodes to the default message.
    fn decode_from(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        <Self as prost::Message>::decode(bytes)
    }
}

impl<M: prost::Message + Default> RpcMessage for M {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RequestVoteRequest {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(uint64, tag = "2")]
    pub last_log_index: u64,
    #[prost(uint64, tag = "3")]
    pub last_log_term: u64,
    #[prost(string, tag = "4")]
    pub candidate_name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RequestVoteResponse {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(bool, tag = "2")]
    pub vote_granted: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LogEntry {
    #[prost(uint64, tag = "1")]
    pub index: u64,
    #[prost(uint64, tag = "2")]
    pub term: u64,
    #[prost(string, tag = "3")]
    pub command_name: String,
    #[prost(bytes, tag = "4")]
    pub command: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AppendEntriesRequest {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(uint64, tag = "2")]
    pub prev_log_index: u64,
    #[prost(uint64, tag = "3")]
    pub prev_log_term: u64,
    #[prost(uint64, tag = "4")]
    pub commit_index: u64,
    #[prost(string, tag = "5")]
    pub leader_name: String,
    #[prost(message, repeated, tag = "6")]
    pub entries: Vec<LogEntry>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AppendEntriesResponse {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(uint64, tag = "2")]
    pub index: u64,
    #[prost(uint64, tag = "3")]
    pub commit_index: u64,
    #[prost(bool, tag = "4")]
    pub success: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotRequest {
    #[prost(string, tag = "1")]
    pub leader_name: String,
    #[prost(uint64, tag = "2")]
    pub last_index: u64,
    #[prost(uint64, tag = "3")]
    pub last_term: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotPeer {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub connection_string: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotRecoveryRequest {
    #[prost(string, tag = "1")]
    pub leader_name: String,
    #[prost(uint64, tag = "2")]
    pub last_index: u64,
    #[prost(uint64, tag = "3")]
    pub last_term: u64,
    #[prost(message, repeated, tag = "4")]
    pub peers: Vec<SnapshotPeer>,
    #[prost(bytes, tag = "5")]
    pub state: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SnapshotRecoveryResponse {
    #[prost(uint64, tag = "1")]
    pub term: u64,
    #[prost(bool, tag = "2")]
    pub success: bool,
    #[prost(uint64, tag = "3")]
    pub commit_index: u64,
}
