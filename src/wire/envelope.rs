use crate::wire::frame::Multipart;
use bytes::Bytes;
use std::fmt;

const VOTE_TAG: &str = "vote";
const APPEND_ENTRIES_TAG: &str = "appendEntries";

/// MessageTag is frame 0 of every RPC message and tells the receiver how to decode frame 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageTag {
    Vote,
    AppendEntries,
}

impl MessageTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageTag::Vote => VOTE_TAG,
            MessageTag::AppendEntries => APPEND_ENTRIES_TAG,
        }
    }

    fn from_frame(frame: &[u8]) -> Option<Self> {
        match frame {
            f if f == VOTE_TAG.as_bytes() => Some(MessageTag::Vote),
            f if f == APPEND_ENTRIES_TAG.as_bytes() => Some(MessageTag::AppendEntries),
            _ => None,
        }
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RpcEnvelope is a tag plus the engine-encoded body, exactly as it travels between nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RpcEnvelope {
    pub(crate) tag: MessageTag,
    pub(crate) body: Bytes,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub(crate) enum EnvelopeError {
    #[error("Message has no frames")]
    MissingTag,
    #[error("Unrecognized message tag {0:?}")]
    UnrecognizedTag(String),
    #[error("'{0}' message has no body frame")]
    MissingBody(MessageTag),
}

impl RpcEnvelope {
    pub(crate) fn new(tag: MessageTag, body: Bytes) -> Self {
        RpcEnvelope { tag, body }
    }

    pub(crate) fn into_multipart(self) -> Multipart {
        Multipart::new(vec![Bytes::from_static(self.tag.as_str().as_bytes()), self.body])
    }

    /// Frames past the body are ignored.
    pub(crate) fn from_multipart(message: Multipart) -> Result<Self, EnvelopeError> {
        let mut frames = message.into_frames().into_iter();
        let tag_frame = frames.next().ok_or(EnvelopeError::MissingTag)?;
        let tag = MessageTag::from_frame(&tag_frame)
            .ok_or_else(|| EnvelopeError::UnrecognizedTag(String::from_utf8_lossy(&tag_frame).into_owned()))?;
        let body = frames.next().ok_or(EnvelopeError::MissingBody(tag))?;

        Ok(RpcEnvelope { tag, body })
    }
}
