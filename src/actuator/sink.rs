//! Host-side actuator sink that logs commanded outputs instead of driving pins.

use tracing::debug;

use super::{ActuatorSink, Axis};

/// Records the last commanded outputs and traces every write.
#[derive(Debug, Default, Clone)]
pub struct TracingSink {
    pwm_x: Option<u16>,
    pwm_y: Option<u16>,
    laser: bool,
    neutral_count: u32,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last pulse width written to an axis, `None` before the first write
    pub fn pwm(&self, axis: Axis) -> Option<u16> {
        match axis {
            Axis::X => self.pwm_x,
            Axis::Y => self.pwm_y,
        }
    }

    pub fn laser(&self) -> bool {
        self.laser
    }

    /// Number of neutral commands received
    pub fn neutral_count(&self) -> u32 {
        self.neutral_count
    }
}

impl ActuatorSink for TracingSink {
    fn apply_pwm(&mut self, axis: Axis, micros: u16) {
        match axis {
            Axis::X => self.pwm_x = Some(micros),
            Axis::Y => self.pwm_y = Some(micros),
        }
        debug!(target: "gimbal_link::actuator::output", "servo {:?} = {} µs", axis, micros);
    }

    fn apply_neutral(&mut self, micros: u16) {
        self.pwm_x = Some(micros);
        self.pwm_y = Some(micros);
        self.neutral_count += 1;
        debug!(target: "gimbal_link::actuator::output", "servos = neutral ({} µs)", micros);
    }

    fn set_laser_pin(&mut self, on: bool) {
        self.laser = on;
        debug!(target: "gimbal_link::actuator::output", "laser pin = {}", on);
    }
}
