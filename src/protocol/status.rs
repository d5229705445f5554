//! # Status Mask
//!
//! Named status flags, packed into a single byte only at the wire boundary.

use serde::Serialize;

/// Servo power bit
pub const STATUS_PWR_SERVO: u8 = 1 << 0;
/// Laser power bit
pub const STATUS_PWR_LASER: u8 = 1 << 1;
/// X axis last driven by raw PWM (clear = by angle)
pub const STATUS_PWM_X_MODE: u8 = 1 << 2;
/// Y axis last driven by raw PWM (clear = by angle)
pub const STATUS_PWM_Y_MODE: u8 = 1 << 3;
/// Last inbound frame had the correct length
pub const STATUS_PACKET_LEN_OK: u8 = 1 << 4;
/// Last inbound frame passed the CRC check
pub const STATUS_CRC_OK: u8 = 1 << 5;

/// Live status flags reported in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusMask {
    pub servo_powered: bool,
    pub laser_powered: bool,
    pub x_pwm_mode: bool,
    pub y_pwm_mode: bool,
    pub length_ok: bool,
    pub crc_ok: bool,
}

impl StatusMask {
    /// Pack into the telemetry status byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use gimbal_link::protocol::status::StatusMask;
    ///
    /// let status = StatusMask { laser_powered: true, crc_ok: true, ..StatusMask::default() };
    /// assert_eq!(status.to_byte(), 0x22);
    /// ```
    #[must_use]
    pub fn to_byte(self) -> u8 {
        [
            (self.servo_powered, STATUS_PWR_SERVO),
            (self.laser_powered, STATUS_PWR_LASER),
            (self.x_pwm_mode, STATUS_PWM_X_MODE),
            (self.y_pwm_mode, STATUS_PWM_Y_MODE),
            (self.length_ok, STATUS_PACKET_LEN_OK),
            (self.crc_ok, STATUS_CRC_OK),
        ]
        .iter()
        .filter(|(set, _)| *set)
        .fold(0, |byte, (_, bit)| byte | bit)
    }

    /// Unpack a telemetry status byte. Unknown high bits are ignored.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self {
            servo_powered: byte & STATUS_PWR_SERVO != 0,
            laser_powered: byte & STATUS_PWR_LASER != 0,
            x_pwm_mode: byte & STATUS_PWM_X_MODE != 0,
            y_pwm_mode: byte & STATUS_PWM_Y_MODE != 0,
            length_ok: byte & STATUS_PACKET_LEN_OK != 0,
            crc_ok: byte & STATUS_CRC_OK != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions() {
        assert_eq!(STATUS_PWR_SERVO, 0x01);
        assert_eq!(STATUS_PWR_LASER, 0x02);
        assert_eq!(STATUS_PWM_X_MODE, 0x04);
        assert_eq!(STATUS_PWM_Y_MODE, 0x08);
        assert_eq!(STATUS_PACKET_LEN_OK, 0x10);
        assert_eq!(STATUS_CRC_OK, 0x20);
    }

    #[test]
    fn test_empty_mask_is_zero() {
        assert_eq!(StatusMask::default().to_byte(), 0);
    }

    #[test]
    fn test_pack_each_flag() {
        let status = StatusMask {
            servo_powered: true,
            y_pwm_mode: true,
            length_ok: true,
            ..StatusMask::default()
        };
        assert_eq!(status.to_byte(), 0x01 | 0x08 | 0x10);
    }

    #[test]
    fn test_unpack_ignores_high_bits() {
        let status = StatusMask::from_byte(0xC0 | STATUS_PWM_X_MODE);
        assert!(status.x_pwm_mode);
        assert!(!status.servo_powered);
        assert_eq!(status.to_byte(), STATUS_PWM_X_MODE);
    }

    #[test]
    fn test_all_bytes_within_mask_survive_unpack() {
        for byte in 0..=0x3Fu8 {
            assert_eq!(StatusMask::from_byte(byte).to_byte(), byte);
        }
    }
}
