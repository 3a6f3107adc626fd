//! HDLC-derived frame escaping.
//!
//! Only the flag delimiter and the two-byte control escape are borrowed from
//! HDLC. There are no address or control fields and no bit stuffing.
//!
//! ```text
//! ┌──────┬──────────────────────────────┬──────┐
//! │ 0x7E │ packet, 0x7E → 0x7D 0x5E     │ 0x7E │
//! │      │         0x7D → 0x7D 0x5D     │      │
//! └──────┴──────────────────────────────┴──────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::HdlcError;

/// Frame boundary marker.
pub const DELIMITER: u8 = 0x7E;

/// Escape marker; the following byte encodes a reserved value.
pub const ESCAPE: u8 = 0x7D;

/// Code following [`ESCAPE`] for a literal `0x7D`.
pub const ESCAPED_ESCAPE: u8 = 0x5D;

/// Code following [`ESCAPE`] for a literal `0x7E`.
pub const ESCAPED_DELIMITER: u8 = 0x5E;

/// Wrap a packet in delimiters, escaping reserved bytes.
pub fn escape(packet: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(packet.len() + 2);
    escape_into(packet, &mut dst);
    dst.freeze()
}

/// Append the framed form of `packet` to `dst`.
pub fn escape_into(packet: &[u8], dst: &mut BytesMut) {
    dst.reserve(packet.len() + 2);
    dst.put_u8(DELIMITER);
    for &byte in packet {
        match byte {
            DELIMITER => dst.put_slice(&[ESCAPE, ESCAPED_DELIMITER]),
            ESCAPE => dst.put_slice(&[ESCAPE, ESCAPED_ESCAPE]),
            other => dst.put_u8(other),
        }
    }
    dst.put_u8(DELIMITER);
}

/// Strip delimiters and resolve escape sequences.
///
/// Every `0x7E` is dropped wherever it appears, not only at the ends. An
/// escape byte must be followed by `0x5D` or `0x5E`; anything else, or an
/// escape in the last position, rejects the whole frame.
pub fn unescape(frame: &[u8]) -> Result<Bytes, HdlcError> {
    let mut out = BytesMut::with_capacity(frame.len());
    let mut bytes = frame.iter().copied().enumerate();

    while let Some((offset, byte)) = bytes.next() {
        match byte {
            DELIMITER => {}
            ESCAPE => match bytes.next() {
                Some((_, ESCAPED_ESCAPE)) => out.put_u8(ESCAPE),
                Some((_, ESCAPED_DELIMITER)) => out.put_u8(DELIMITER),
                Some((offset, byte)) => return Err(HdlcError::InvalidEscape { offset, byte }),
                None => return Err(HdlcError::DanglingEscape { offset }),
            },
            other => out.put_u8(other),
        }
    }

    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn escape_plain_bytes() {
        assert_eq!(escape(&[0x01, 0x02]).as_ref(), &[0x7E, 0x01, 0x02, 0x7E]);
    }

    #[test]
    fn escape_reserved_bytes() {
        assert_eq!(
            escape(&[0x7D, 0x7E, 0x33]).as_ref(),
            &[0x7E, 0x7D, 0x5D, 0x7D, 0x5E, 0x33, 0x7E]
        );
    }

    #[test]
    fn escape_empty_packet() {
        assert_eq!(escape(&[]).as_ref(), &[DELIMITER, DELIMITER]);
    }

    #[test]
    fn escape_into_appends() {
        let mut dst = BytesMut::from(&[0xAA][..]);
        escape_into(&[0x7E], &mut dst);
        assert_eq!(dst.as_ref(), &[0xAA, 0x7E, 0x7D, 0x5E, 0x7E]);
    }

    #[test]
    fn unescape_resolves_sequences() {
        let out = unescape(&[0x7E, 0x7D, 0x5D, 0x7D, 0x5E, 0x33, 0x7E]).unwrap();
        assert_eq!(out.as_ref(), &[0x7D, 0x7E, 0x33]);
    }

    #[test]
    fn unescape_drops_delimiters_anywhere() {
        let out = unescape(&[0x01, 0x7E, 0x02, 0x7E, 0x7E, 0x03]).unwrap();
        assert_eq!(out.as_ref(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn unescape_only_delimiters_is_empty() {
        assert!(unescape(&[0x7E, 0x7E]).unwrap().is_empty());
        assert!(unescape(&[]).unwrap().is_empty());
    }

    #[test]
    fn unescape_rejects_invalid_escape_code() {
        let err = unescape(&[0x7E, 0x7D, 0x7D, 0x7E]).unwrap_err();
        assert_eq!(err, HdlcError::InvalidEscape { offset: 2, byte: 0x7D });
    }

    #[test]
    fn unescape_rejects_escaped_delimiter_byte() {
        let err = unescape(&[0x7E, 0x7D, 0x7E]).unwrap_err();
        assert_eq!(err, HdlcError::InvalidEscape { offset: 2, byte: 0x7E });
    }

    #[test]
    fn unescape_rejects_trailing_escape() {
        let err = unescape(&[0x01, 0x7D]).unwrap_err();
        assert_eq!(err, HdlcError::DanglingEscape { offset: 1 });
    }

    proptest! {
        #[test]
        fn escape_output_has_no_inner_delimiters(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let framed = escape(&data);
            prop_assert_eq!(framed[0], DELIMITER);
            prop_assert_eq!(framed[framed.len() - 1], DELIMITER);
            prop_assert!(!framed[1..framed.len() - 1].contains(&DELIMITER));
        }

        #[test]
        fn unescape_inverts_escape(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let restored = unescape(&escape(&data)).unwrap();
            prop_assert_eq!(restored.as_ref(), data.as_slice());
        }

        #[test]
        fn unescape_is_total(data in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = unescape(&data);
        }
    }
}
