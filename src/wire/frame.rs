use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use std::mem;
use tokio_util::codec::{Decoder, Encoder};

// Frame layout on the stream:
//
// | 1 byte | 1 or 8 bytes (big endian) | size bytes |
// | flags  | size                      | payload    |
//
// A message is a run of frames where every frame but the last has FLAG_MORE set.
const FLAG_MORE: u8 = 0x01;
const FLAG_LONG: u8 = 0x02;
const SHORT_HEADER_LEN: usize = 2;
const LONG_HEADER_LEN: usize = 9;
const MAX_FRAMES_PER_MESSAGE: usize = 16;

/// Multipart is one logical message made of ordered frames.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Multipart {
    frames: Vec<Bytes>,
}

impl Multipart {
    pub(crate) fn new(frames: Vec<Bytes>) -> Self {
        Multipart { frames }
    }

    pub(crate) fn single(frame: impl Into<Bytes>) -> Self {
        Multipart {
            frames: vec![frame.into()],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Bytes> {
        self.frames.get(index)
    }

    pub(crate) fn into_frames(self) -> Vec<Bytes> {
        self.frames
    }
}

/// FrameCodec turns a byte stream into `Multipart` messages and back.
pub(crate) struct FrameCodec {
    max_frame_size: usize,
    // Frames of a message whose final frame hasn't arrived yet.
    partial: Vec<Bytes>,
}

impl FrameCodec {
    pub(crate) fn new(max_frame_size: usize) -> Self {
        FrameCodec {
            max_frame_size,
            partial: Vec::new(),
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Multipart;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Multipart>, io::Error> {
        loop {
            if src.is_empty() {
                return Ok(None);
            }

            let flags = src[0];
            if flags & !(FLAG_MORE | FLAG_LONG) != 0 {
                return Err(invalid_data(format!("Unknown frame flags {:#04x}", flags)));
            }

            let (header_len, size) = if flags & FLAG_LONG != 0 {
                if src.len() < LONG_HEADER_LEN {
                    return Ok(None);
                }
                let mut size_bytes = [0u8; 8];
                size_bytes.copy_from_slice(&src[1..LONG_HEADER_LEN]);
                (LONG_HEADER_LEN, u64::from_be_bytes(size_bytes))
            } else {
                if src.len() < SHORT_HEADER_LEN {
                    return Ok(None);
                }
                (SHORT_HEADER_LEN, src[1] as u64)
            };

            if size > self.max_frame_size as u64 {
                return Err(invalid_data(format!(
                    "Frame of {} bytes exceeds limit of {} bytes",
                    size, self.max_frame_size
                )));
            }
            let size = size as usize;

            if src.len() < header_len + size {
                src.reserve(header_len + size - src.len());
                return Ok(None);
            }

            src.advance(header_len);
            self.partial.push(src.split_to(size).freeze());

            if flags & FLAG_MORE == 0 {
                return Ok(Some(Multipart::new(mem::take(&mut self.partial))));
            }
            if self.partial.len() >= MAX_FRAMES_PER_MESSAGE {
                return Err(invalid_data(format!(
                    "Message exceeds {} frames",
                    MAX_FRAMES_PER_MESSAGE
                )));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Multipart>, io::Error> {
        match self.decode(src)? {
            Some(message) => Ok(Some(message)),
            None if src.is_empty() && self.partial.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Connection closed in the middle of a message",
            )),
        }
    }
}

impl Encoder<Multipart> for FrameCodec {
    type Error = io::Error;

    fn encode(&mut self, message: Multipart, dst: &mut BytesMut) -> Result<(), io::Error> {
        if message.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot send a message with no frames",
            ));
        }

        if let Some(frame) = message.frames.iter().find(|f| f.len() > self.max_frame_size) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame of {} bytes exceeds limit of {} bytes",
                    frame.len(),
                    self.max_frame_size
                ),
            ));
        }

        let last = message.len() - 1;
        for (i, frame) in message.into_frames().into_iter().enumerate() {
            let more = if i < last { FLAG_MORE } else { 0 };
            if frame.len() > u8::MAX as usize {
                dst.reserve(LONG_HEADER_LEN + frame.len());
                dst.put_u8(more | FLAG_LONG);
                dst.put_u64(frame.len() as u64);
            } else {
                dst.reserve(SHORT_HEADER_LEN + frame.len());
                dst.put_u8(more);
                dst.put_u8(frame.len() as u8);
            }
            dst.extend_from_slice(&frame);
        }

        Ok(())
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(message: Multipart) -> BytesMut {
        let mut buf = BytesMut::new();
        FrameCodec::new(1024).encode(message, &mut buf).unwrap();
        buf
    }

    #[test]
    fn short_frames_layout() {
        let buf = encoded(Multipart::new(vec![Bytes::from_static(b"vote"), Bytes::from_static(b"ab")]));
        assert_eq!(&buf[..], &[0x01, 4, b'v', b'o', b't', b'e', 0x00, 2, b'a', b'b'][..]);
    }

    #[test]
    fn long_frame_uses_eight_byte_size() {
        let payload = Bytes::from(vec![7u8; 300]);
        let mut buf = encoded(Multipart::single(payload.clone()));
        assert_eq!(buf[0], FLAG_LONG);
        assert_eq!(&buf[1..9], &300u64.to_be_bytes()[..]);

        let decoded = FrameCodec::new(1024).decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, Multipart::single(payload));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_waits_for_complete_message() {
        let full = encoded(Multipart::new(vec![
            Bytes::from_static(b"appendEntries"),
            Bytes::from_static(b"body"),
        ]));
        let mut codec = FrameCodec::new(1024);
        let mut buf = BytesMut::new();

        // Feed one byte at a time; only the final byte completes the message.
        for (i, byte) in full.iter().enumerate() {
            buf.put_u8(*byte);
            let result = codec.decode(&mut buf).unwrap();
            if i + 1 < full.len() {
                assert!(result.is_none(), "decoded early at byte {}", i);
            } else {
                let message = result.unwrap();
                assert_eq!(message.len(), 2);
                assert_eq!(message.get(0).unwrap(), &Bytes::from_static(b"appendEntries"));
                assert_eq!(message.get(1).unwrap(), &Bytes::from_static(b"body"));
            }
        }
    }

    #[test]
    fn decode_back_to_back_messages() {
        let mut buf = encoded(Multipart::single(Bytes::from_static(b"one")));
        buf.extend_from_slice(&encoded(Multipart::single(Bytes::from_static(b"two"))));
        let mut codec = FrameCodec::new(1024);

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Multipart::single(Bytes::from_static(b"one")))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Multipart::single(Bytes::from_static(b"two")))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn empty_frame_is_allowed() {
        let mut buf = encoded(Multipart::new(vec![Bytes::from_static(b"vote"), Bytes::new()]));
        let message = FrameCodec::new(1024).decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.get(1).unwrap().len(), 0);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut buf = encoded(Multipart::single(Bytes::from(vec![0u8; 100])));
        let err = FrameCodec::new(10).decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        let mut out = BytesMut::new();
        let err = FrameCodec::new(10)
            .encode(Multipart::single(Bytes::from(vec![0u8; 100])), &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn oversized_later_frame_writes_nothing() {
        let mut out = BytesMut::new();
        let message = Multipart::new(vec![Bytes::from_static(b"vote"), Bytes::from(vec![0u8; 100])]);
        let err = FrameCodec::new(10).encode(message, &mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let mut buf = BytesMut::from(&[0x80u8, 1, 0][..]);
        let err = FrameCodec::new(1024).decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn empty_message_cannot_be_encoded() {
        let mut buf = BytesMut::new();
        let err = FrameCodec::new(1024).encode(Multipart::default(), &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn eof_mid_message_is_an_error() {
        let mut buf = encoded(Multipart::new(vec![Bytes::from_static(b"vote"), Bytes::from_static(b"x")]));
        buf.truncate(6);
        let err = FrameCodec::new(1024).decode_eof(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
