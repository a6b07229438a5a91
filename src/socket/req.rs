use crate::wire::{Endpoint, FrameCodec, Multipart};
use futures::{SinkExt, StreamExt};
use std::io;
use tokio::net::TcpStream;
use tokio::time::{Duration, Instant};
use tokio_util::codec::Framed;

/// ReqSocket is the requesting half of a request/reply exchange. One is created per outbound
/// call and dropped afterwards.
pub(crate) struct ReqSocket {
    framed: Framed<TcpStream, FrameCodec>,
}

impl ReqSocket {
    /// Connects to `endpoint`. A refused connection is retried every `reconnect_interval`, the
    /// same way a messaging socket reconnects in the background, until `deadline`.
    pub(crate) async fn connect(
        logger: &slog::Logger,
        endpoint: &Endpoint,
        deadline: Instant,
        reconnect_interval: Duration,
        max_frame_size: usize,
    ) -> io::Result<Self> {
        loop {
            match tokio::time::timeout_at(deadline, TcpStream::connect((endpoint.host(), endpoint.port()))).await {
                Ok(Ok(stream)) => {
                    stream.set_nodelay(true)?;
                    return Ok(ReqSocket {
                        framed: Framed::new(stream, FrameCodec::new(max_frame_size)),
                    });
                }
                Ok(Err(e)) => {
                    slog::trace!(logger, "Connect to {} failed: {}", endpoint, e);
                    if Instant::now() + reconnect_interval >= deadline {
                        tokio::time::sleep_until(deadline).await;
                        return Err(e);
                    }
                    tokio::time::sleep(reconnect_interval).await;
                }
                Err(_elapsed) => {
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("Timed out connecting to {}", endpoint),
                    ));
                }
            }
        }
    }

    pub(crate) async fn send(&mut self, message: Multipart) -> io::Result<()> {
        self.framed.send(message).await
    }

    pub(crate) async fn recv(&mut self) -> io::Result<Multipart> {
        match self.framed.next().await {
            Some(result) => result,
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Peer closed the connection before replying",
            )),
        }
    }
}
