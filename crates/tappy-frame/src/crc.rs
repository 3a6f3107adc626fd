//! CRC16 used by TCMP packets.
//!
//! CRC-16/ISO-IEC-14443-3-A (reflected, register seeded with `0x6363`), with
//! the result carried big-endian on the wire.

use crc::{Crc, CRC_16_ISO_IEC_14443_3_A};

const TCMP_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_ISO_IEC_14443_3_A);

/// Register value before any byte is processed, and the CRC of empty input.
pub const CRC_SEED: u16 = 0x6363;

/// Compute the CRC16 of `data`.
pub fn crc16(data: &[u8]) -> u16 {
    TCMP_CRC.checksum(data)
}

/// Compute the CRC16 of `data` as the two big-endian bytes appended to a packet.
pub fn crc16_bytes(data: &[u8]) -> [u8; 2] {
    crc16(data).to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Bit-at-a-time form the reader firmware documents.
    fn bitwise_crc16(data: &[u8]) -> u16 {
        let mut crc = CRC_SEED;
        for &byte in data {
            let mut v = (crc ^ u16::from(byte)) & 0xFF;
            let mut tcrc = 0u16;
            for _ in 0..8 {
                tcrc = if (tcrc ^ v) & 1 != 0 {
                    (tcrc >> 1) ^ 0x8408
                } else {
                    tcrc >> 1
                };
                v >>= 1;
            }
            crc = (crc >> 8) ^ tcrc;
        }
        crc
    }

    #[test]
    fn empty_input_is_seed() {
        assert_eq!(crc16(&[]), CRC_SEED);
    }

    #[test]
    fn standard_check_value() {
        assert_eq!(crc16(b"123456789"), 0xBF05);
    }

    #[test]
    fn known_packet_crcs() {
        // Header and body of the FA03/FE packet with payload 7D 7E 33.
        let body = [0x00, 0x08, 0xF8, 0xFA, 0x03, 0xFE, 0x7D, 0x7E, 0x33];
        assert_eq!(crc16(&body), 0xC1EE);
        assert_eq!(crc16_bytes(&body), [0xC1, 0xEE]);

        let body = [0x00, 0x08, 0xF8, 0x01, 0x02, 0x01, 0x7D, 0x7E, 0x33];
        assert_eq!(crc16_bytes(&body), [0xE2, 0xFE]);
    }

    #[test]
    fn deterministic_across_calls() {
        let data: Vec<u8> = (0..=255).collect();
        let first = crc16(&data);
        for _ in 0..4 {
            assert_eq!(crc16(&data), first);
        }
    }

    #[test]
    fn single_bit_flip_changes_crc() {
        let data = [0x10, 0x20, 0x30, 0x40];
        let mut flipped = data;
        flipped[2] ^= 0x01;
        assert_ne!(crc16(&data), crc16(&flipped));
    }

    proptest! {
        #[test]
        fn table_crc_matches_bitwise_form(data in proptest::collection::vec(any::<u8>(), 0..300)) {
            prop_assert_eq!(crc16(&data), bitwise_crc16(&data));
        }
    }
}
