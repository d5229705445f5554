//! # Link Protocol Module
//!
//! Fixed-size binary frames exchanged with the base station over the
//! packet radio.
//!
//! This module handles:
//! - Command frame encoding/decoding (base station → node, header 0x37)
//! - Telemetry frame encoding/decoding (node → base station, header 0x38)
//! - CRC16-CCITT-FALSE checksum calculation
//! - Wire angle encoding and the packed status byte

pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod status;
