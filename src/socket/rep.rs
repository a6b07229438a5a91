use crate::socket::SocketError;
use crate::wire::{Endpoint, FrameCodec, Multipart};
use futures::{SinkExt, StreamExt};
use std::io;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

/// RepSocket is the replying half of a request/reply exchange.
///
/// Requests from every connected peer are queued into a single stream, and `recv()`/`send()`
/// must alternate: each reply goes to the peer that sent the most recently received request.
/// Calling `recv()` again without replying abandons that request; its sender will time out.
pub(crate) struct RepSocket {
    logger: slog::Logger,
    local_endpoint: Endpoint,
    inbound: mpsc::Receiver<InboundRequest>,
    pending_reply: Option<oneshot::Sender<Multipart>>,
    acceptor: JoinHandle<()>,
}

pub(crate) struct InboundRequest {
    message: Multipart,
    reply_to: oneshot::Sender<Multipart>,
}

impl RepSocket {
    pub(crate) async fn bind(
        logger: slog::Logger,
        endpoint: &Endpoint,
        max_frame_size: usize,
        queue_size: usize,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind((endpoint.bind_host(), endpoint.port())).await?;
        let local_endpoint = endpoint.bound_at(listener.local_addr()?);

        let (tx, rx) = mpsc::channel(queue_size);
        let acceptor = tokio::spawn(accept_loop(logger.clone(), listener, tx, max_frame_size));

        Ok(RepSocket {
            logger,
            local_endpoint,
            inbound: rx,
            pending_reply: None,
            acceptor,
        })
    }

    /// A socket fed directly from the returned queue instead of a listener.
    #[cfg(test)]
    pub(crate) fn from_queue(
        logger: slog::Logger,
        local_endpoint: Endpoint,
    ) -> (Self, mpsc::Sender<InboundRequest>) {
        let (tx, rx) = mpsc::channel(1);
        let socket = RepSocket {
            logger,
            local_endpoint,
            inbound: rx,
            pending_reply: None,
            acceptor: tokio::spawn(async {}),
        };
        (socket, tx)
    }

    pub(crate) fn local_endpoint(&self) -> &Endpoint {
        &self.local_endpoint
    }

    /// Waits for the next request from any peer. Cancel safe.
    pub(crate) async fn recv(&mut self) -> Result<Multipart, SocketError> {
        if self.pending_reply.take().is_some() {
            slog::debug!(self.logger, "Abandoning previous request without a reply");
        }

        match self.inbound.recv().await {
            Some(request) => {
                self.pending_reply = Some(request.reply_to);
                Ok(request.message)
            }
            None => Err(SocketError::Closed),
        }
    }

    /// Replies to the request returned by the last `recv()`.
    pub(crate) fn send(&mut self, reply: Multipart) -> Result<(), SocketError> {
        let reply_to = self.pending_reply.take().ok_or(SocketError::NoPendingRequest)?;
        if reply_to.send(reply).is_err() {
            // Peer hung up while we were working on its request. Same as a dropped connection.
            slog::debug!(self.logger, "Requester disconnected before the reply was sent");
        }

        Ok(())
    }
}

impl Drop for RepSocket {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

async fn accept_loop(
    logger: slog::Logger,
    listener: TcpListener,
    inbound: mpsc::Sender<InboundRequest>,
    max_frame_size: usize,
) {
    loop {
        match listener.accept().await {
            Ok((stream, remote_addr)) => {
                let conn_logger = logger.new(slog::o!("Remote" => remote_addr.to_string()));
                slog::trace!(conn_logger, "Accepted connection");
                if let Err(e) = stream.set_nodelay(true) {
                    slog::debug!(conn_logger, "Failed to set TCP_NODELAY: {}", e);
                }
                tokio::spawn(serve_connection(conn_logger, stream, inbound.clone(), max_frame_size));
            }
            Err(e) if is_transient_accept_error(&e) => {
                slog::warn!(logger, "Failed to accept connection: {}", e);
            }
            Err(e) => {
                slog::error!(logger, "Listener failed, no longer accepting connections: {}", e);
                return;
            }
        }
    }
}

fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

// Requests on one connection are forwarded strictly one at a time, so replies on that connection
// come back in the order the requests were sent.
async fn serve_connection(
    logger: slog::Logger,
    stream: TcpStream,
    inbound: mpsc::Sender<InboundRequest>,
    max_frame_size: usize,
) {
    let mut framed = Framed::new(stream, FrameCodec::new(max_frame_size));

    loop {
        let message = tokio::select! {
            _ = inbound.closed() => return,
            next = framed.next() => match next {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    slog::debug!(logger, "Dropping connection after read failure: {}", e);
                    return;
                }
                None => {
                    slog::trace!(logger, "Connection closed by peer");
                    return;
                }
            },
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = InboundRequest {
            message,
            reply_to: reply_tx,
        };
        if inbound.send(request).await.is_err() {
            return;
        }

        match reply_rx.await {
            Ok(reply) => {
                if let Err(e) = framed.send(reply).await {
                    slog::debug!(logger, "Dropping connection after write failure: {}", e);
                    return;
                }
            }
            Err(_) => slog::trace!(logger, "Request was dropped without a reply"),
        }
    }
}
