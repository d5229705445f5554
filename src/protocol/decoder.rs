//! # Frame Decoder
//!
//! Validates and parses inbound 24-byte frames.
//!
//! Decode failures are never fatal: the caller drops the frame and reports
//! the outcome through the status mask.

use thiserror::Error;

use super::crc::crc16_ccitt;
use super::frame::*;
use super::status::StatusMask;

/// Reasons a frame is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input was not exactly 24 bytes
    #[error("frame length {actual} bytes, expected 24")]
    Length { actual: usize },

    /// Header byte does not match the expected frame kind
    #[error("header mismatch: expected 0x{expected:02X}, got 0x{found:02X}")]
    HeaderMismatch { expected: u8, found: u8 },

    /// Frame addressed to a different satellite
    #[error("satellite id mismatch: expected 0x{expected:02X}, got 0x{found:02X}")]
    SatelliteIdMismatch { expected: u8, found: u8 },

    /// Recomputed CRC differs from the transmitted one
    #[error("CRC mismatch: computed 0x{computed:04X}, received 0x{received:04X}")]
    CrcMismatch { computed: u16, received: u16 },
}

impl DecodeError {
    /// Length and CRC outcome implied by this failure
    pub fn validity(&self) -> FrameValidity {
        match self {
            DecodeError::Length { .. } => FrameValidity {
                length_ok: false,
                crc_ok: false,
            },
            _ => FrameValidity {
                length_ok: true,
                crc_ok: false,
            },
        }
    }
}

/// Length and CRC outcome of a decode attempt, fed into [`StatusMask`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameValidity {
    pub length_ok: bool,
    pub crc_ok: bool,
}

impl FrameValidity {
    /// Outcome of a successful decode
    pub const VALID: FrameValidity = FrameValidity {
        length_ok: true,
        crc_ok: true,
    };

    /// Derive the outcome from any decode result
    pub fn of<T>(result: &Result<T, DecodeError>) -> Self {
        match result {
            Ok(_) => Self::VALID,
            Err(e) => e.validity(),
        }
    }
}

/// Check length, header, satellite id and CRC of a raw frame
///
/// # Arguments
///
/// * `bytes` - Raw frame bytes as received
/// * `expected_header` - Header marker of the expected frame kind
/// * `expected_sat_id` - Satellite id the frame must carry
///
/// # Returns
///
/// * `Result<&Frame, DecodeError>` - The same bytes as a fixed-size frame
///
/// # Errors
///
/// Returns error if:
/// - Input is not exactly 24 bytes
/// - Header byte or satellite id differs
/// - CRC check fails
pub fn validate_frame(bytes: &[u8], expected_header: u8, expected_sat_id: u8) -> Result<&Frame, DecodeError> {
    let frame: &Frame = bytes
        .try_into()
        .map_err(|_| DecodeError::Length { actual: bytes.len() })?;

    if frame[0] != expected_header {
        return Err(DecodeError::HeaderMismatch {
            expected: expected_header,
            found: frame[0],
        });
    }

    if frame[1] != expected_sat_id {
        return Err(DecodeError::SatelliteIdMismatch {
            expected: expected_sat_id,
            found: frame[1],
        });
    }

    let computed = crc16_ccitt(&frame[..CRC_COVERED_LEN]);
    let received = u16::from_le_bytes([frame[22], frame[23]]);
    if computed != received {
        return Err(DecodeError::CrcMismatch { computed, received });
    }

    Ok(frame)
}

/// Decode an uplink command frame
///
/// # Errors
///
/// See [`validate_frame`].
///
/// # Examples
///
/// ```
/// use gimbal_link::protocol::decoder::decode_command;
/// use gimbal_link::protocol::encoder::encode_command;
/// use gimbal_link::protocol::frame::CommandFrame;
///
/// let command = CommandFrame { script: Some(1), ..CommandFrame::no_change(5) };
/// let decoded = decode_command(&encode_command(&command))?;
/// assert_eq!(decoded, command);
/// # Ok::<(), gimbal_link::protocol::decoder::DecodeError>(())
/// ```
pub fn decode_command(bytes: &[u8]) -> Result<CommandFrame, DecodeError> {
    let frame = validate_frame(bytes, COMMAND_HEADER, SATELLITE_ID)?;

    Ok(CommandFrame {
        packet_number: frame[2],
        script: optional_byte(frame[3]),
        step_period: optional_byte(frame[4]),
        telemetry_period: optional_byte(frame[5]),
        servo_power: decode_switch(frame[6]),
        laser_power: decode_switch(frame[7]),
        pwm_x: optional_pwm(u16::from_le_bytes([frame[8], frame[9]])),
        pwm_y: optional_pwm(u16::from_le_bytes([frame[10], frame[11]])),
        angle_x: optional_byte(frame[12]).map(wire_byte_to_angle),
        angle_y: optional_byte(frame[13]).map(wire_byte_to_angle),
    })
}

/// Decode a downlink telemetry frame
///
/// # Errors
///
/// See [`validate_frame`].
pub fn decode_telemetry(bytes: &[u8]) -> Result<TelemetryFrame, DecodeError> {
    let frame = validate_frame(bytes, TELEMETRY_HEADER, SATELLITE_ID)?;

    Ok(TelemetryFrame {
        packet_number: frame[2],
        last_command_number: frame[3],
        uptime_ms: u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]),
        status: StatusMask::from_byte(frame[8]),
        mode: frame[9],
        scan_step: frame[10],
        pwm_x: u16::from_le_bytes([frame[11], frame[12]]),
        pwm_y: u16::from_le_bytes([frame[13], frame[14]]),
        angle_x: frame[15] as i8,
        angle_y: frame[16] as i8,
        laser_power: frame[17] != 0,
        servo_power: frame[18] != 0,
    })
}

fn optional_byte(byte: u8) -> Option<u8> {
    (byte != NO_CHANGE).then_some(byte)
}

/// Wire PWM is clamped to 500..=2500 µs; 0xFFFF is the sentinel
fn optional_pwm(value: u16) -> Option<u16> {
    (value != PWM_NO_CHANGE).then(|| value.clamp(PWM_WIRE_MIN_US, PWM_WIRE_MAX_US))
}

/// 0 = off, 1 = on, anything else leaves the switch alone
fn decode_switch(byte: u8) -> Option<bool> {
    match byte {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}
