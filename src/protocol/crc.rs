//! # CRC16-CCITT-FALSE Implementation
//!
//! CRC-16 checksum shared by command and telemetry frames.
//!
//! **Polynomial**: 0x1021 (x^16 + x^12 + x^5 + 1)
//! **Initial Value**: 0x0000
//! **Reflection**: none, bytes are processed MSB first

/// CRC-16-CCITT polynomial
const CRC16_POLY: u16 = 0x1021;

/// Precomputed CRC16 lookup table for fast calculation
const CRC16_TABLE: [u16; 256] = generate_crc16_table();

/// Generate CRC16 lookup table at compile time
const fn generate_crc16_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;

    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;

        while j < 8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

/// Calculate CRC16-CCITT-FALSE checksum using lookup table
///
/// Both the node and the base station run this exact routine, so a frame
/// produced by the encoder always validates in the decoder.
///
/// # Arguments
///
/// * `data` - Byte slice to checksum (the first 22 bytes of a frame)
///
/// # Returns
///
/// * `u16` - Calculated CRC16
///
/// # Examples
///
/// ```
/// use gimbal_link::protocol::crc::crc16_ccitt;
///
/// assert_eq!(crc16_ccitt(b"123456789"), 0x31C3);
/// ```
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        let index = ((crc >> 8) as u8 ^ byte) as usize;
        crc = (crc << 8) ^ CRC16_TABLE[index];
    }

    crc
}

/// Bitwise CRC16 (slow, mirrors the firmware's per-byte update loop)
///
/// Used to verify the lookup table implementation.
#[allow(dead_code)]
fn crc16_ccitt_slow(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;

    for &byte in data {
        crc ^= u16::from(byte) << 8;

        for _ in 0..8 {
            if (crc & 0x8000) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}
