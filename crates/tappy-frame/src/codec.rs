//! `tokio_util::codec` adapter.
//!
//! Applies the same delimiter rules as [`Reassembler`](crate::Reassembler),
//! so a `FramedRead` over an async byte stream yields the same events as
//! feeding the stream chunk by chunk.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::FrameError;
use crate::hdlc::{escape_into, DELIMITER};
use crate::message::{Message, TcmpMessage};
use crate::reassembler::{classify_frame, FrameEvent};
use crate::tcmp::compose_message;

/// Codec producing [`FrameEvent`]s and consuming [`Message`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TappyCodec;

impl TappyCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for TappyCodec {
    type Item = FrameEvent;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(pos) = src.iter().position(|&b| b == DELIMITER) {
            let candidate = src.split_to(pos + 1).freeze();
            if let Some(event) = classify_frame(candidate) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(event) = self.decode(src)? {
            return Ok(Some(event));
        }
        if !src.is_empty() {
            debug!(len = src.len(), "discarding unterminated frame at end of stream");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<Message> for TappyCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        escape_into(&item.to_packet(), dst);
        Ok(())
    }
}

impl<'a, M: TcmpMessage + ?Sized> Encoder<&'a M> for TappyCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a M, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let packet = compose_message(item)?;
        escape_into(&packet, dst);
        Ok(())
    }
}
