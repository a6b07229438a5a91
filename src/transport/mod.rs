mod client;
mod failure;
mod options;
mod server;
mod shutdown;
mod transporter;

pub use failure::TransportFailure;
pub use options::TransportOptions;
pub use transporter::InboundServer;
pub use transporter::InstallError;
pub use transporter::IllegalOptions;
pub use transporter::MessageTransporter;
