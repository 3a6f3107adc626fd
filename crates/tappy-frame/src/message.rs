use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::tcmp::{put_packet, MAX_PAYLOAD};

/// Anything that can be sent to a Tappy as a TCMP command.
pub trait TcmpMessage {
    /// Two-byte command family.
    fn command_family(&self) -> [u8; 2];

    /// One-byte command code within the family.
    fn command_code(&self) -> u8;

    /// Command payload, possibly empty.
    fn payload(&self) -> &[u8];
}

/// A decoded or outgoing TCMP message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    family: [u8; 2],
    code: u8,
    payload: Bytes,
}

impl Message {
    /// Create a message, rejecting payloads that do not fit the length field.
    pub fn new(family: [u8; 2], code: u8, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.len() > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self::from_parts(family, code, payload))
    }

    /// Create a message with an empty payload.
    pub fn empty(family: [u8; 2], code: u8) -> Self {
        Self::from_parts(family, code, Bytes::new())
    }

    pub(crate) fn from_parts(family: [u8; 2], code: u8, payload: Bytes) -> Self {
        Self {
            family,
            code,
            payload,
        }
    }

    pub fn family(&self) -> [u8; 2] {
        self.family
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload as a cheaply clonable buffer.
    pub fn payload_bytes(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    /// Encode as an unframed TCMP packet.
    pub fn to_packet(&self) -> Bytes {
        let mut dst = BytesMut::new();
        // Length was validated at construction.
        put_packet(self.family, self.code, &self.payload, &mut dst);
        dst.freeze()
    }

    /// Encode as a complete escaped frame, ready for a transport.
    pub fn to_frame(&self) -> Bytes {
        crate::hdlc::escape(&self.to_packet())
    }
}

impl TcmpMessage for Message {
    fn command_family(&self) -> [u8; 2] {
        self.family
    }

    fn command_code(&self) -> u8 {
        self.code
    }

    fn payload(&self) -> &[u8] {
        &self.payload
    }
}
