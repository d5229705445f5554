//! # Frame Encoder
//!
//! Serializes command and telemetry frames into 24-byte buffers.

use super::crc::crc16_ccitt;
use super::frame::*;

/// Encode an uplink command into a complete frame
///
/// Absent fields are written as their "no change" sentinels, reserved bytes
/// as zero, and the CRC16 of the first 22 bytes is appended little-endian.
///
/// # Arguments
///
/// * `command` - Command fields
///
/// # Returns
///
/// * `Frame` - 24 bytes ready for the transport
///
/// # Examples
///
/// ```
/// use gimbal_link::protocol::encoder::encode_command;
/// use gimbal_link::protocol::frame::CommandFrame;
///
/// let frame = encode_command(&CommandFrame::no_change(1));
/// assert_eq!(frame.len(), 24);
/// assert_eq!(frame[0], 0x37);
/// ```
pub fn encode_command(command: &CommandFrame) -> Frame {
    let mut frame = [0u8; FRAME_LEN];

    frame[0] = COMMAND_HEADER;
    frame[1] = SATELLITE_ID;
    frame[2] = command.packet_number;
    frame[3] = command.script.unwrap_or(NO_CHANGE);
    frame[4] = command.step_period.unwrap_or(NO_CHANGE);
    frame[5] = command.telemetry_period.unwrap_or(NO_CHANGE);
    frame[6] = encode_switch(command.servo_power);
    frame[7] = encode_switch(command.laser_power);
    frame[8..10].copy_from_slice(&command.pwm_x.unwrap_or(PWM_NO_CHANGE).to_le_bytes());
    frame[10..12].copy_from_slice(&command.pwm_y.unwrap_or(PWM_NO_CHANGE).to_le_bytes());
    frame[12] = command.angle_x.map_or(NO_CHANGE, angle_to_wire_byte);
    frame[13] = command.angle_y.map_or(NO_CHANGE, angle_to_wire_byte);
    // 14..22 reserved, left zero

    seal(&mut frame);
    frame
}

/// Encode a downlink telemetry frame
///
/// # Arguments
///
/// * `telemetry` - Telemetry fields
///
/// # Returns
///
/// * `Frame` - 24 bytes ready for the transport
pub fn encode_telemetry(telemetry: &TelemetryFrame) -> Frame {
    let mut frame = [0u8; FRAME_LEN];

    frame[0] = TELEMETRY_HEADER;
    frame[1] = SATELLITE_ID;
    frame[2] = telemetry.packet_number;
    frame[3] = telemetry.last_command_number;
    frame[4..8].copy_from_slice(&telemetry.uptime_ms.to_le_bytes());
    frame[8] = telemetry.status.to_byte();
    frame[9] = telemetry.mode;
    frame[10] = telemetry.scan_step;
    frame[11..13].copy_from_slice(&telemetry.pwm_x.to_le_bytes());
    frame[13..15].copy_from_slice(&telemetry.pwm_y.to_le_bytes());
    frame[15] = telemetry.angle_x as u8;
    frame[16] = telemetry.angle_y as u8;
    frame[17] = u8::from(telemetry.laser_power);
    frame[18] = u8::from(telemetry.servo_power);
    // 19..22 reserved, left zero

    seal(&mut frame);
    frame
}

fn encode_switch(value: Option<bool>) -> u8 {
    match value {
        Some(true) => 1,
        Some(false) => 0,
        None => NO_CHANGE,
    }
}

/// Append the CRC of the covered bytes
fn seal(frame: &mut Frame) {
    let crc = crc16_ccitt(&frame[..CRC_COVERED_LEN]);
    frame[CRC_COVERED_LEN..].copy_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::status::StatusMask;

    #[test]
    fn test_command_header_bytes() {
        let frame = encode_command(&CommandFrame::no_change(9));
        assert_eq!(frame[0], COMMAND_HEADER);
        assert_eq!(frame[1], SATELLITE_ID);
        assert_eq!(frame[2], 9);
    }

    #[test]
    fn test_command_sentinels() {
        let frame = encode_command(&CommandFrame::no_change(0));

        for (index, &byte) in frame[3..8].iter().enumerate() {
            assert_eq!(byte, NO_CHANGE, "byte {} should be the sentinel", index + 3);
        }
        assert_eq!(&frame[8..12], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(frame[12], NO_CHANGE);
        assert_eq!(frame[13], NO_CHANGE);
    }

    #[test]
    fn test_command_reserved_bytes_zero() {
        let frame = encode_command(&CommandFrame::no_change(0));
        assert!(frame[14..22].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_command_field_layout() {
        let command = CommandFrame {
            packet_number: 3,
            script: Some(4),
            step_period: Some(30),
            telemetry_period: Some(100),
            servo_power: Some(true),
            laser_power: Some(false),
            pwm_x: Some(1500),
            pwm_y: Some(0x0834),
            angle_x: Some(-40),
            angle_y: Some(10),
        };
        let frame = encode_command(&command);

        assert_eq!(frame[3], 4);
        assert_eq!(frame[4], 30);
        assert_eq!(frame[5], 100);
        assert_eq!(frame[6], 1);
        assert_eq!(frame[7], 0);
        // Little-endian multibyte fields
        assert_eq!(&frame[8..10], &[0xDC, 0x05]);
        assert_eq!(&frame[10..12], &[0x34, 0x08]);
        assert_eq!(frame[12], 0);
        assert_eq!(frame[13], 50);
    }

    #[test]
    fn test_command_crc_appended_little_endian() {
        let frame = encode_command(&CommandFrame::no_change(1));
        let crc = crc16_ccitt(&frame[..22]);
        assert_eq!(frame[22], (crc & 0xFF) as u8);
        assert_eq!(frame[23], (crc >> 8) as u8);
    }

    #[test]
    fn test_telemetry_field_layout() {
        let telemetry = TelemetryFrame {
            packet_number: 200,
            last_command_number: 17,
            uptime_ms: 0x0102_0304,
            status: StatusMask {
                servo_powered: true,
                laser_powered: true,
                ..StatusMask::default()
            },
            mode: 2,
            scan_step: 5,
            pwm_x: 1000,
            pwm_y: 2100,
            angle_x: -40,
            angle_y: 40,
            laser_power: true,
            servo_power: false,
        };
        let frame = encode_telemetry(&telemetry);

        assert_eq!(frame[0], TELEMETRY_HEADER);
        assert_eq!(frame[1], SATELLITE_ID);
        assert_eq!(frame[2], 200);
        assert_eq!(frame[3], 17);
        assert_eq!(&frame[4..8], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(frame[8], 0x03);
        assert_eq!(frame[9], 2);
        assert_eq!(frame[10], 5);
        assert_eq!(&frame[11..13], &1000u16.to_le_bytes());
        assert_eq!(&frame[13..15], &2100u16.to_le_bytes());
        assert_eq!(frame[15] as i8, -40);
        assert_eq!(frame[16] as i8, 40);
        assert_eq!(frame[17], 1);
        assert_eq!(frame[18], 0);
        assert_eq!(&frame[19..22], &[0, 0, 0]);
    }
}
