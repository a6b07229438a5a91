mod endpoint;
mod envelope;
mod frame;

pub use endpoint::Endpoint;
pub use endpoint::EndpointError;
pub use envelope::MessageTag;

pub(crate) use envelope::EnvelopeError;
pub(crate) use envelope::RpcEnvelope;
pub(crate) use frame::FrameCodec;
pub(crate) use frame::Multipart;
