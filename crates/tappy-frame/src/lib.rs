//! Wire codec for the Tappy Command Message Protocol (TCMP).
//!
//! Every message travels as:
//! - a TCMP packet: 2-byte big-endian length, a length checksum, a 2-byte
//!   command family, a 1-byte command code, the payload and a CRC16
//! - wrapped in an HDLC-style frame: `0x7E` delimiters with `0x7E`/`0x7D`
//!   escaped inside the packet
//!
//! Inbound bytes arrive in arbitrary chunks; the [`Reassembler`] turns them
//! back into [`Message`]s or classified framing errors.

pub mod crc;
pub mod error;
pub mod hdlc;
pub mod message;
pub mod reassembler;
pub mod tcmp;

#[cfg(feature = "async")]
pub mod codec;

pub use crc::{crc16, crc16_bytes};
pub use error::{DecodeError, FrameError, HdlcError, Result};
pub use hdlc::{escape, unescape, DELIMITER, ESCAPE};
pub use message::{Message, TcmpMessage};
pub use reassembler::{classify_frame, FrameEvent, Reassembler, ReassemblerConfig};
pub use tcmp::{
    compose, compose_message, decode_packet, encode_packet, length_checksum, MAX_PAYLOAD,
    MIN_PACKET_SIZE,
};

#[cfg(feature = "async")]
pub use codec::TappyCodec;
