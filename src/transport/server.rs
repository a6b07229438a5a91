use crate::raft::{AppendEntriesRequest, RaftRpcHandler, RequestVoteRequest, RpcMessage};
use crate::socket::RepSocket;
use crate::transport::shutdown::ShutdownSignal;
use crate::wire::{EnvelopeError, MessageTag, Multipart, RpcEnvelope};
use bytes::Bytes;
use std::sync::Arc;

/// RpcServer is the inbound half of the transport. It owns one reply socket and feeds every
/// request it receives to the local consensus engine, one at a time.
pub(crate) struct RpcServer {
    logger: slog::Logger,
    handler: Arc<dyn RaftRpcHandler>,
}

impl RpcServer {
    pub(crate) fn new(logger: slog::Logger, handler: Arc<dyn RaftRpcHandler>) -> Self {
        RpcServer { logger, handler }
    }

    /// Serves until `shutdown_signal` resolves or the socket stops delivering requests. A receive
    /// failure ends serving for good.
    pub(crate) async fn run(self, mut socket: RepSocket, mut shutdown_signal: ShutdownSignal) {
        slog::info!(self.logger, "Serving consensus RPCs on '{}'", socket.local_endpoint());

        loop {
            let message = tokio::select! {
                _ = &mut shutdown_signal => {
                    slog::info!(self.logger, "Shutdown requested");
                    break;
                }
                result = socket.recv() => match result {
                    Ok(message) => message,
                    Err(e) => {
                        slog::error!(self.logger, "Receive failed, no longer serving: {}", e);
                        break;
                    }
                },
            };

            if let Some(reply) = self.handle_message(message).await {
                if let Err(e) = socket.send(reply) {
                    slog::error!(self.logger, "Reply failed, no longer serving: {}", e);
                    break;
                }
            }
        }

        slog::info!(self.logger, "Server run() has exited");
    }

    // Returns None when the message gets no reply at all.
    async fn handle_message(&self, message: Multipart) -> Option<Multipart> {
        let envelope = match RpcEnvelope::from_multipart(message) {
            Ok(envelope) => envelope,
            Err(e @ EnvelopeError::MissingBody(_)) => {
                let reason = e.to_string();
                slog::debug!(self.logger, "Replying with error: {}", reason);
                return Some(Multipart::single(reason));
            }
            Err(e) => {
                // Protocol skew between nodes. The sender will time out waiting.
                slog::warn!(self.logger, "Dropping message without reply: {}", e);
                return None;
            }
        };

        let reply = match envelope.tag {
            MessageTag::Vote => self.handle_request_vote(envelope.body).await,
            MessageTag::AppendEntries => self.handle_append_entries(envelope.body).await,
        };

        Some(Multipart::single(reply))
    }

    async fn handle_request_vote(&self, body: Bytes) -> Bytes {
        let request = match RequestVoteRequest::decode_from(&body) {
            Ok(request) => request,
            Err(e) => return self.error_reply(MessageTag::Vote, e),
        };

        slog::trace!(self.logger, "ServerWire - {:?}", request);
        let response = self.handler.request_vote(request).await;
        slog::trace!(self.logger, "ServerWire - {:?}", response);

        response
            .encode_to_bytes()
            .unwrap_or_else(|e| self.error_reply(MessageTag::Vote, e))
    }

    async fn handle_append_entries(&self, body: Bytes) -> Bytes {
        let request = match AppendEntriesRequest::decode_from(&body) {
            Ok(request) => request,
            Err(e) => return self.error_reply(MessageTag::AppendEntries, e),
        };

        slog::trace!(self.logger, "ServerWire - {:?}", request);
        let response = self.handler.append_entries(request).await;
        slog::trace!(self.logger, "ServerWire - {:?}", response);

        response
            .encode_to_bytes()
            .unwrap_or_else(|e| self.error_reply(MessageTag::AppendEntries, e))
    }

    // The requester can't decode this as a response, so it surfaces there as a decode failure.
    fn error_reply(&self, tag: MessageTag, error: impl std::fmt::Display) -> Bytes {
        let reason = error.to_string();
        slog::debug!(self.logger, "Replying to '{}' with error: {}", tag, reason);
        Bytes::from(reason)
    }
}
