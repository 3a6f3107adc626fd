/// Reasons a deframed packet fails TCMP validation.
///
/// Checks run in a fixed order (length floor, CRC, length checksum, declared
/// length) and the first failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Fewer bytes than the smallest possible packet.
    #[error("packet too short ({len} bytes, min 8)")]
    TooShort { len: usize },

    /// The trailing CRC does not match the packet contents.
    #[error("bad CRC (packet carries {received:#06x}, computed {computed:#06x})")]
    BadCrc { received: u16, computed: u16 },

    /// The length checksum does not match the length bytes.
    #[error("bad length checksum (packet carries {received:#04x}, computed {computed:#04x})")]
    BadLcs { received: u8, computed: u8 },

    /// The declared length does not describe the bytes after the header.
    #[error("bad length (declared {declared}, found {actual})")]
    BadLength { declared: usize, actual: usize },
}

/// Malformed escape sequences inside a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HdlcError {
    /// An escape byte followed by something other than `0x5D` or `0x5E`.
    #[error("invalid escape code {byte:#04x} at offset {offset}")]
    InvalidEscape { offset: usize, byte: u8 },

    /// An escape byte in the last position.
    #[error("dangling escape byte at offset {offset}")]
    DanglingEscape { offset: usize },
}

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The frame contains a malformed escape sequence.
    #[error("invalid frame escaping: {0}")]
    Hdlc(#[from] HdlcError),

    /// The deframed bytes are not a valid TCMP packet.
    #[error("invalid TCMP packet: {0}")]
    Decode(#[from] DecodeError),

    /// An I/O error from a framed stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
