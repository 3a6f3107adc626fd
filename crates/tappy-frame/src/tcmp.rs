//! TCMP packet layout.
//!
//! ```text
//! ┌─────────────┬─────┬──────────────┬──────┬─────────────┬─────────────┐
//! │ Length (2B) │ LCS │ Family (2B)  │ Code │ Payload     │ CRC16 (2B)  │
//! │ big-endian  │ 1B  │              │ 1B   │ (0..65530B) │ big-endian  │
//! └─────────────┴─────┴──────────────┴──────┴─────────────┴─────────────┘
//! ```
//!
//! Length counts everything after the LCS byte (`payload + 5`). The LCS makes
//! the two length bytes plus itself sum to zero mod 256. The CRC covers every
//! byte before it.

use bytes::{BufMut, Bytes, BytesMut};

use crate::crc::crc16;
use crate::error::{DecodeError, FrameError, Result};
use crate::message::{Message, TcmpMessage};

/// Length (2) + length checksum (1).
pub const HEADER_SIZE: usize = 3;

/// Trailing CRC16.
pub const CRC_SIZE: usize = 2;

/// Family (2) + code (1) + CRC (2): the bytes counted by the length field
/// besides the payload.
const FIXED_BODY_SIZE: usize = 5;

/// Smallest valid packet: header, family, code and CRC with an empty payload.
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + FIXED_BODY_SIZE;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize - FIXED_BODY_SIZE;

/// Length checksum over the two length bytes.
pub fn length_checksum(len_hi: u8, len_lo: u8) -> u8 {
    // 0xFF - sum + 1, mod 256
    len_hi.wrapping_add(len_lo).wrapping_neg()
}

/// Append a TCMP packet to `dst`.
pub fn encode_packet(family: [u8; 2], code: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    put_packet(family, code, payload, dst);
    Ok(())
}

/// Build a standalone TCMP packet.
pub fn compose(family: [u8; 2], code: u8, payload: &[u8]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(MIN_PACKET_SIZE + payload.len());
    encode_packet(family, code, payload, &mut dst)?;
    Ok(dst.freeze())
}

/// Build the TCMP packet for anything implementing [`TcmpMessage`].
pub fn compose_message<M: TcmpMessage + ?Sized>(message: &M) -> Result<Bytes> {
    compose(
        message.command_family(),
        message.command_code(),
        message.payload(),
    )
}

/// Callers must have checked `payload.len() <= MAX_PAYLOAD`.
pub(crate) fn put_packet(family: [u8; 2], code: u8, payload: &[u8], dst: &mut BytesMut) {
    let start = dst.len();
    let [len_hi, len_lo] = ((payload.len() + FIXED_BODY_SIZE) as u16).to_be_bytes();

    dst.reserve(MIN_PACKET_SIZE + payload.len());
    dst.put_u8(len_hi);
    dst.put_u8(len_lo);
    dst.put_u8(length_checksum(len_hi, len_lo));
    dst.put_slice(&family);
    dst.put_u8(code);
    dst.put_slice(payload);

    let crc = crc16(&dst[start..]);
    dst.put_u16(crc);
}

/// Validate and parse an unescaped TCMP packet.
pub fn decode_packet(packet: &[u8]) -> std::result::Result<Message, DecodeError> {
    let len = packet.len();
    if len < MIN_PACKET_SIZE {
        return Err(DecodeError::TooShort { len });
    }

    let (body, trailer) = packet.split_at(len - CRC_SIZE);
    let received = u16::from_be_bytes([trailer[0], trailer[1]]);
    let computed = crc16(body);
    if received != computed {
        return Err(DecodeError::BadCrc { received, computed });
    }

    let computed = length_checksum(packet[0], packet[1]);
    if packet[2] != computed {
        return Err(DecodeError::BadLcs {
            received: packet[2],
            computed,
        });
    }

    let declared = usize::from(u16::from_be_bytes([packet[0], packet[1]]));
    let actual = len - HEADER_SIZE;
    if declared != actual {
        return Err(DecodeError::BadLength { declared, actual });
    }

    Ok(Message::from_parts(
        [packet[3], packet[4]],
        packet[5],
        Bytes::copy_from_slice(&packet[6..len - CRC_SIZE]),
    ))
}
