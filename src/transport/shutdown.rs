use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Creates a cancellation pair for a serving loop. The signal resolves once the handle is
/// triggered or dropped.
pub(crate) fn shutdown_pair() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = oneshot::channel();

    (ShutdownHandle { tx }, ShutdownSignal { rx })
}

pub(crate) struct ShutdownHandle {
    tx: oneshot::Sender<()>,
}

impl ShutdownHandle {
    pub(crate) fn trigger(self) {
        // Receiver may already be gone if the loop exited on its own.
        let _ = self.tx.send(());
    }
}

pub(crate) struct ShutdownSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for ShutdownSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Sent value or dropped sender both mean stop.
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}
