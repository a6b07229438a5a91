use crate::raft::{
    AppendEntriesRequest, AppendEntriesResponse, Peer, RaftRpcHandler, RequestVoteRequest, RequestVoteResponse,
    SnapshotRecoveryRequest, SnapshotRecoveryResponse, SnapshotRequest, SnapshotResponse, Transporter,
};
use crate::socket::RepSocket;
use crate::transport::client::RpcClient;
use crate::transport::options::{TransportOptions, TransportOptionsValidated};
use crate::transport::server::RpcServer;
use crate::transport::shutdown::{shutdown_pair, ShutdownHandle};
use crate::transport::TransportFailure;
use crate::wire::{Endpoint, EndpointError, MessageTag};
use std::convert::TryFrom;
use std::io;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// MessageTransporter carries consensus RPCs over request/reply messaging sockets.
///
/// Outbound calls go through `Transporter`. Inbound service starts with `install()`, done once at
/// startup with the local consensus engine as the dispatch target.
pub struct MessageTransporter {
    logger: slog::Logger,
    options: TransportOptionsValidated,
    client: RpcClient,
}

#[derive(Debug, thiserror::Error)]
#[error("Illegal transport options: {0}")]
pub struct IllegalOptions(&'static str);

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Invalid bind address: {0}")]
    InvalidEndpoint(#[from] EndpointError),
    #[error("Failed to bind '{endpoint}': {source}")]
    Bind { endpoint: String, source: io::Error },
}

impl MessageTransporter {
    pub fn new(logger: slog::Logger, options: TransportOptions) -> Result<Self, IllegalOptions> {
        let options = TransportOptionsValidated::try_from(options).map_err(IllegalOptions)?;
        let client = RpcClient::new(logger.new(slog::o!("Component" => "RpcClient")), options.clone());

        Ok(MessageTransporter {
            logger,
            options,
            client,
        })
    }

    /// Binds `bind_address` (e.g. `tcp://*:5555`) and serves inbound RPCs on a background task,
    /// handing each decoded request to `handler`.
    pub async fn install<H: RaftRpcHandler>(
        &self,
        bind_address: &str,
        handler: Arc<H>,
    ) -> Result<InboundServer, InstallError> {
        let endpoint: Endpoint = bind_address.parse()?;
        slog::info!(self.logger, "Binding consensus RPC socket to '{}'", endpoint);

        let server_logger = self.logger.new(slog::o!("Component" => "RpcServer"));
        let socket = RepSocket::bind(
            server_logger.clone(),
            &endpoint,
            self.options.max_frame_size,
            self.options.inbound_queue_size,
        )
        .await
        .map_err(|source| InstallError::Bind {
            endpoint: endpoint.to_string(),
            source,
        })?;
        let local_endpoint = socket.local_endpoint().clone();

        let (shutdown_handle, shutdown_signal) = shutdown_pair();
        let server = RpcServer::new(server_logger, handler);
        let task = tokio::spawn(server.run(socket, shutdown_signal));

        Ok(InboundServer {
            local_endpoint,
            shutdown_handle,
            task,
        })
    }
}

#[async_trait::async_trait]
impl Transporter for MessageTransporter {
    async fn send_vote_request(
        &self,
        peer: &Peer,
        request: &RequestVoteRequest,
    ) -> Result<RequestVoteResponse, TransportFailure> {
        self.client
            .call(&peer.connection_string, MessageTag::Vote, request)
            .await
    }

    async fn send_append_entries_request(
        &self,
        peer: &Peer,
        request: &AppendEntriesRequest,
    ) -> Result<AppendEntriesResponse, TransportFailure> {
        self.client
            .call(&peer.connection_string, MessageTag::AppendEntries, request)
            .await
    }

    // Snapshot transfer has no message tag on this transport. Engines relying on it for log
    // compaction will stall and need another path.
    async fn send_snapshot_request(
        &self,
        peer: &Peer,
        _request: &SnapshotRequest,
    ) -> Result<SnapshotResponse, TransportFailure> {
        slog::trace!(self.logger, "Snapshot request to {} not supported", peer.name);
        Err(TransportFailure::Unsupported)
    }

    async fn send_snapshot_recovery_request(
        &self,
        peer: &Peer,
        _request: &SnapshotRecoveryRequest,
    ) -> Result<SnapshotRecoveryResponse, TransportFailure> {
        slog::trace!(self.logger, "Snapshot recovery request to {} not supported", peer.name);
        Err(TransportFailure::Unsupported)
    }
}

/// InboundServer is the handle to a running inbound serving task. Dropping it stops the task.
pub struct InboundServer {
    local_endpoint: Endpoint,
    shutdown_handle: ShutdownHandle,
    task: JoinHandle<()>,
}

impl InboundServer {
    /// The bound address. Differs from the requested one when port 0 was asked for.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local_endpoint
    }

    /// Stops serving and waits for the serving task to exit.
    pub async fn shutdown(self) {
        self.shutdown_handle.trigger();
        let _ = self.task.await;
    }
}
