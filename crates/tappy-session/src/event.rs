use std::fmt;

use bytes::Bytes;
use tappy_frame::{DecodeError, FrameEvent, HdlcError};
use tappy_transport::TransportError;

/// Category of a condition reported to the error listener.
///
/// The numeric codes match the ones used by Tappy host libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorType {
    /// A send was attempted while the communicator was disconnected.
    NotConnected = 0x00,
    /// The communicator reported a failure.
    ConnectionError = 0x01,
    /// A received frame had a malformed escape sequence.
    InvalidHdlc = 0x02,
    /// A received frame deframed cleanly but failed packet validation.
    InvalidTcmp = 0x03,
}

impl ErrorType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::NotConnected => "NOT_CONNECTED",
            ErrorType::ConnectionError => "CONNECTION_ERROR",
            ErrorType::InvalidHdlc => "INVALID_HDLC",
            ErrorType::InvalidTcmp => "INVALID_TCMP",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A condition delivered to the error listener.
#[derive(Debug, thiserror::Error)]
pub enum ErrorEvent {
    #[error("not connected")]
    NotConnected,

    #[error("connection error: {0}")]
    ConnectionError(#[source] TransportError),

    #[error("invalid HDLC frame ({} bytes): {reason}", packet.len())]
    InvalidHdlc {
        /// Raw frame as received, delimiters included.
        packet: Bytes,
        #[source]
        reason: HdlcError,
    },

    #[error("invalid TCMP packet ({} bytes): {reason}", message.len())]
    InvalidTcmp {
        /// Raw frame as received, delimiters included.
        packet: Bytes,
        /// Unescaped packet that failed validation.
        message: Bytes,
        #[source]
        reason: DecodeError,
    },
}

impl ErrorEvent {
    pub fn kind(&self) -> ErrorType {
        match self {
            ErrorEvent::NotConnected => ErrorType::NotConnected,
            ErrorEvent::ConnectionError(_) => ErrorType::ConnectionError,
            ErrorEvent::InvalidHdlc { .. } => ErrorType::InvalidHdlc,
            ErrorEvent::InvalidTcmp { .. } => ErrorType::InvalidTcmp,
        }
    }

    /// Raw frame bytes for the two frame-level kinds.
    pub fn packet(&self) -> Option<&Bytes> {
        match self {
            ErrorEvent::InvalidHdlc { packet, .. } | ErrorEvent::InvalidTcmp { packet, .. } => {
                Some(packet)
            }
            _ => None,
        }
    }
}

impl From<TransportError> for ErrorEvent {
    fn from(err: TransportError) -> Self {
        ErrorEvent::ConnectionError(err)
    }
}

/// Split a reassembler event into a message or the error event a session
/// would report for it.
pub fn split_frame_event(event: FrameEvent) -> Result<tappy_frame::Message, ErrorEvent> {
    match event {
        FrameEvent::Message(message) => Ok(message),
        FrameEvent::InvalidHdlc { packet, reason } => {
            Err(ErrorEvent::InvalidHdlc { packet, reason })
        }
        FrameEvent::InvalidTcmp {
            packet,
            message,
            reason,
        } => Err(ErrorEvent::InvalidTcmp {
            packet,
            message,
            reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorType::NotConnected.code(), 0x00);
        assert_eq!(ErrorType::ConnectionError.code(), 0x01);
        assert_eq!(ErrorType::InvalidHdlc.code(), 0x02);
        assert_eq!(ErrorType::InvalidTcmp.code(), 0x03);
    }

    #[test]
    fn names() {
        assert_eq!(ErrorType::InvalidHdlc.to_string(), "INVALID_HDLC");
        assert_eq!(ErrorType::NotConnected.as_str(), "NOT_CONNECTED");
    }

    #[test]
    fn kind_and_packet() {
        let event = ErrorEvent::InvalidHdlc {
            packet: Bytes::from_static(&[0x7D, 0x7E]),
            reason: HdlcError::InvalidEscape {
                offset: 1,
                byte: 0x7E,
            },
        };
        assert_eq!(event.kind(), ErrorType::InvalidHdlc);
        assert_eq!(event.packet().map(|p| p.len()), Some(2));

        let event = ErrorEvent::from(TransportError::ConnectionClosed);
        assert_eq!(event.kind(), ErrorType::ConnectionError);
        assert!(event.packet().is_none());
        assert!(event.to_string().contains("closed"));
    }

    #[test]
    fn frame_event_split() {
        let event = FrameEvent::InvalidTcmp {
            packet: Bytes::from_static(&[0x01, 0x7E]),
            message: Bytes::from_static(&[0x01]),
            reason: DecodeError::TooShort { len: 1 },
        };
        let err = split_frame_event(event).unwrap_err();
        assert_eq!(err.kind(), ErrorType::InvalidTcmp);
        assert!(err.to_string().contains("1 bytes"));
    }
}
