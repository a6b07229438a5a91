//! Request/reply sockets on top of TCP.
mod error;
mod rep;
mod req;

pub(crate) use error::SocketError;
pub(crate) use rep::RepSocket;
pub(crate) use req::ReqSocket;
