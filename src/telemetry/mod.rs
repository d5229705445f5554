//! # Telemetry Module
//!
//! Builds downlink telemetry frames and journals them to JSONL files.
//!
//! This module handles:
//! - Snapshotting actuator and scan state into a `TelemetryFrame`
//! - Numbering telemetry packets
//! - Writing frames to rotating JSONL files (see [`journal`])

pub mod journal;

pub use journal::TelemetryJournal;

use crate::actuator::{ActuatorModel, ActuatorSink, Axis};
use crate::protocol::frame::TelemetryFrame;
use crate::scan::ScanStateMachine;

/// Telemetry frame factory.
///
/// Holds only the telemetry packet counter; everything else is read from
/// the actuator model and scan state machine at build time.
#[derive(Debug, Default, Clone)]
pub struct TelemetryBuilder {
    packet_number: u8,
}

impl TelemetryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of the most recently built frame, 0 before the first build
    pub fn packet_number(&self) -> u8 {
        self.packet_number
    }

    /// Build the next telemetry frame.
    ///
    /// The packet counter is incremented (wrapping) before use, so the first
    /// frame is numbered 1.
    ///
    /// # Arguments
    ///
    /// * `actuators` - Source of pose, pulse widths, power flags and status
    /// * `scan` - Source of the mode ordinal and scan step
    /// * `last_command_number` - Packet number of the last accepted command
    /// * `uptime_ms` - Clock reading
    pub fn build<S: ActuatorSink>(
        &mut self,
        actuators: &ActuatorModel<S>,
        scan: &ScanStateMachine,
        last_command_number: u8,
        uptime_ms: u32,
    ) -> TelemetryFrame {
        self.packet_number = self.packet_number.wrapping_add(1);

        let output = actuators.output();
        TelemetryFrame {
            packet_number: self.packet_number,
            last_command_number,
            uptime_ms,
            status: actuators.status(),
            mode: scan.mode().ordinal(),
            scan_step: scan.step(),
            pwm_x: actuators.pwm(Axis::X),
            pwm_y: actuators.pwm(Axis::Y),
            angle_x: output.angle_x,
            angle_y: output.angle_y,
            laser_power: output.laser_on,
            servo_power: output.servo_powered,
        }
    }
}
