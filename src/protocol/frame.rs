//! # Frame Constants and Types
//!
//! Core definitions for the 24-byte uplink (command) and downlink
//! (telemetry) frames exchanged with the base station.

use serde::Serialize;

use super::status::StatusMask;

/// Every frame on the link is exactly this long
pub const FRAME_LEN: usize = 24;

/// Number of leading bytes covered by the CRC
pub const CRC_COVERED_LEN: usize = 22;

/// Command frame header byte (base station → node)
pub const COMMAND_HEADER: u8 = 0x37;

/// Telemetry frame header byte (node → base station)
pub const TELEMETRY_HEADER: u8 = 0x38;

/// Satellite identifier carried by both frame kinds
pub const SATELLITE_ID: u8 = 0x25;

/// Byte-field sentinel meaning "leave this parameter unchanged"
pub const NO_CHANGE: u8 = 0xFF;

/// PWM-field sentinel meaning "leave this axis unchanged"
pub const PWM_NO_CHANGE: u16 = 0xFFFF;

/// Angle domain in degrees
pub const ANGLE_MIN: i8 = -40;
pub const ANGLE_MAX: i8 = 40;

/// Wire encoding of angles: `angle + 40`, so 40 is zero degrees
pub const ANGLE_WIRE_OFFSET: i8 = 40;
pub const ANGLE_WIRE_MAX: u8 = 80;

/// PWM range accepted on the wire in microseconds
pub const PWM_WIRE_MIN_US: u16 = 500;
pub const PWM_WIRE_MAX_US: u16 = 2500;

/// A complete raw frame
pub type Frame = [u8; FRAME_LEN];

/// Encode a signed angle as its wire byte.
///
/// Out-of-range angles are clamped to [-40, 40] first, so the result is
/// always in 0..=80.
///
/// # Examples
///
/// ```
/// use gimbal_link::protocol::frame::angle_to_wire_byte;
///
/// assert_eq!(angle_to_wire_byte(0), 40);
/// assert_eq!(angle_to_wire_byte(-40), 0);
/// assert_eq!(angle_to_wire_byte(100), 80);
/// ```
#[must_use]
pub fn angle_to_wire_byte(angle: i8) -> u8 {
    (angle.clamp(ANGLE_MIN, ANGLE_MAX) + ANGLE_WIRE_OFFSET) as u8
}

/// Decode a wire byte into a signed angle.
///
/// Bytes above 80 are clamped to 80. The 0xFF sentinel is handled by the
/// frame decoder before this is called.
///
/// # Examples
///
/// ```
/// use gimbal_link::protocol::frame::wire_byte_to_angle;
///
/// assert_eq!(wire_byte_to_angle(40), 0);
/// assert_eq!(wire_byte_to_angle(200), 40);
/// ```
#[must_use]
pub fn wire_byte_to_angle(byte: u8) -> i8 {
    byte.min(ANGLE_WIRE_MAX) as i8 - ANGLE_WIRE_OFFSET
}

/// Uplink command (BS2CS)
///
/// Every optional field is `None` when the frame carried the "no change"
/// sentinel for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFrame {
    /// Sender's packet counter (wraps at 256)
    pub packet_number: u8,

    /// Script / mode selector
    pub script: Option<u8>,

    /// Scan step period, in multiples of the configured period unit
    pub step_period: Option<u8>,

    /// Telemetry period, in multiples of the configured period unit
    pub telemetry_period: Option<u8>,

    /// Servo power flag
    pub servo_power: Option<bool>,

    /// Laser power flag
    pub laser_power: Option<bool>,

    /// Raw X pulse width in microseconds
    pub pwm_x: Option<u16>,

    /// Raw Y pulse width in microseconds
    pub pwm_y: Option<u16>,

    /// X angle in degrees
    pub angle_x: Option<i8>,

    /// Y angle in degrees
    pub angle_y: Option<i8>,
}

impl CommandFrame {
    /// A command that changes nothing, only advancing the packet number.
    #[must_use]
    pub fn no_change(packet_number: u8) -> Self {
        Self {
            packet_number,
            ..Self::default()
        }
    }

    /// Whether the frame sets any axis directly (by PWM or by angle).
    #[must_use]
    pub fn has_direct_position(&self) -> bool {
        self.pwm_x.is_some() || self.pwm_y.is_some() || self.angle_x.is_some() || self.angle_y.is_some()
    }
}

/// Downlink telemetry (CS2BS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TelemetryFrame {
    /// Telemetry counter (independent of the command counter)
    pub packet_number: u8,

    /// Packet number of the last accepted command
    pub last_command_number: u8,

    /// Milliseconds since boot
    pub uptime_ms: u32,

    /// Power, axis mode and link validity flags
    pub status: StatusMask,

    /// Scan mode ordinal
    pub mode: u8,

    /// Current scan step
    pub scan_step: u8,

    /// Actual X pulse width in microseconds
    pub pwm_x: u16,

    /// Actual Y pulse width in microseconds
    pub pwm_y: u16,

    /// Actual X angle in degrees
    pub angle_x: i8,

    /// Actual Y angle in degrees
    pub angle_y: i8,

    /// Laser state
    pub laser_power: bool,

    /// Servo power state
    pub servo_power: bool,
}
