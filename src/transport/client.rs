use crate::raft::RpcMessage;
use crate::socket::ReqSocket;
use crate::transport::options::TransportOptionsValidated;
use crate::transport::TransportFailure;
use crate::wire::{Endpoint, MessageTag, RpcEnvelope};
use bytes::Bytes;
use tokio::time::Instant;

/// RpcClient makes outbound RPCs. Every call opens its own socket, sends one request, waits for
/// one reply, and closes the socket. Nothing is retried here.
#[derive(Clone)]
pub(crate) struct RpcClient {
    logger: slog::Logger,
    options: TransportOptionsValidated,
}

impl RpcClient {
    pub(crate) fn new(logger: slog::Logger, options: TransportOptionsValidated) -> Self {
        RpcClient { logger, options }
    }

    pub(crate) async fn call<Req, Resp>(
        &self,
        peer_address: &str,
        tag: MessageTag,
        request: &Req,
    ) -> Result<Resp, TransportFailure>
    where
        Req: RpcMessage,
        Resp: RpcMessage,
    {
        let body = request.encode_to_bytes().map_err(|e| {
            slog::debug!(self.logger, "Encoding '{}' request failed: {}", tag, e);
            TransportFailure::from(e)
        })?;

        let reply = self.send(peer_address, tag, body).await?;

        Resp::decode_from(&reply).map_err(|e| {
            slog::debug!(self.logger, "Decoding '{}' reply from {} failed: {}", tag, peer_address, e);
            TransportFailure::from(e)
        })
    }

    /// Sends an already encoded body and returns the raw reply body.
    pub(crate) async fn send(&self, peer_address: &str, tag: MessageTag, body: Bytes) -> Result<Bytes, TransportFailure> {
        let logger = self
            .logger
            .new(slog::o!("Peer" => peer_address.to_string(), "Tag" => tag.as_str()));

        let result = self.round_trip(&logger, peer_address, tag, body).await;
        if let Err(failure) = &result {
            slog::debug!(logger, "No response: {}", failure);
        }

        result
    }

    async fn round_trip(
        &self,
        logger: &slog::Logger,
        peer_address: &str,
        tag: MessageTag,
        body: Bytes,
    ) -> Result<Bytes, TransportFailure> {
        let endpoint: Endpoint = peer_address.parse()?;
        let deadline = Instant::now() + self.options.reply_timeout;

        slog::trace!(logger, "Connecting to peer");
        let mut socket = ReqSocket::connect(
            logger,
            &endpoint,
            deadline,
            self.options.reconnect_interval,
            self.options.max_frame_size,
        )
        .await
        .map_err(TransportFailure::Connect)?;

        let request = RpcEnvelope::new(tag, body).into_multipart();
        match tokio::time::timeout_at(deadline, socket.send(request)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(TransportFailure::Send(e)),
            Err(_) => return Err(TransportFailure::Timeout(self.options.reply_timeout)),
        }

        let reply = match tokio::time::timeout_at(deadline, socket.recv()).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => return Err(TransportFailure::Receive(e)),
            Err(_) => return Err(TransportFailure::Timeout(self.options.reply_timeout)),
        };
        slog::trace!(logger, "Received reply with {} frame(s)", reply.len());

        // Replies are a single frame. A reply with no frames reads as an empty body.
        Ok(reply.get(0).cloned().unwrap_or_default())
    }
}
