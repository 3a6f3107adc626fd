use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{DecodeError, HdlcError};
use crate::hdlc::{unescape, DELIMITER};
use crate::message::Message;
use crate::tcmp::decode_packet;

const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Outcome of one delimited frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A valid TCMP message.
    Message(Message),

    /// The frame contains a malformed escape sequence.
    InvalidHdlc {
        /// Raw frame bytes as received, delimiters included.
        packet: Bytes,
        reason: HdlcError,
    },

    /// The frame deframed cleanly but is not a valid TCMP packet.
    InvalidTcmp {
        /// Raw frame bytes as received, delimiters included.
        packet: Bytes,
        /// The unescaped bytes that failed validation.
        message: Bytes,
        reason: DecodeError,
    },
}

impl FrameEvent {
    pub fn is_message(&self) -> bool {
        matches!(self, FrameEvent::Message(_))
    }
}

/// Classify a candidate frame ending in a delimiter.
///
/// Returns `None` when the frame holds nothing but delimiters, so bare
/// leading or trailing delimiters never surface as errors.
pub fn classify_frame(packet: Bytes) -> Option<FrameEvent> {
    let unescaped = match unescape(&packet) {
        Ok(unescaped) => unescaped,
        Err(reason) => return Some(FrameEvent::InvalidHdlc { packet, reason }),
    };

    if unescaped.is_empty() {
        return None;
    }

    match decode_packet(&unescaped) {
        Ok(message) => Some(FrameEvent::Message(message)),
        Err(reason) => Some(FrameEvent::InvalidTcmp {
            packet,
            message: unescaped,
            reason,
        }),
    }
}

/// Configuration for the stream reassembler.
#[derive(Debug, Clone)]
pub struct ReassemblerConfig {
    /// Initial buffer capacity in bytes. The buffer grows as needed.
    pub initial_capacity: usize,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
        }
    }
}

/// Accumulates transport chunks and splits them on delimiter bytes.
///
/// Every delimiter closes the current candidate frame: everything buffered
/// since the previous delimiter, plus the delimiter itself. The buffer is then
/// empty again, so a frame's closing delimiter is never reused as the next
/// frame's opening one.
#[derive(Debug)]
pub struct Reassembler {
    buf: BytesMut,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::with_config(ReassemblerConfig::default())
    }

    pub fn with_config(config: ReassemblerConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(config.initial_capacity),
        }
    }

    /// Consume a chunk, calling `emit` in-line for every completed frame.
    ///
    /// A chunk may hold any number of frames and may end mid-frame; the
    /// partial tail stays buffered for the next call.
    pub fn feed<F>(&mut self, chunk: &[u8], mut emit: F)
    where
        F: FnMut(FrameEvent),
    {
        let mut rest = chunk;
        while let Some(pos) = rest.iter().position(|&b| b == DELIMITER) {
            self.buf.extend_from_slice(&rest[..=pos]);
            rest = &rest[pos + 1..];

            let candidate = self.buf.split().freeze();
            let len = candidate.len();
            match classify_frame(candidate) {
                Some(event) => {
                    trace!(len, message = event.is_message(), "frame completed");
                    emit(event);
                }
                None => trace!(len, "empty frame skipped"),
            }
        }
        self.buf.extend_from_slice(rest);
    }

    /// Consume a chunk and collect the completed frames.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        self.feed(chunk, |event| events.push(event));
        events
    }

    /// Number of bytes waiting for a delimiter.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
