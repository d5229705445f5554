//! # Actuator Model
//!
//! Owns the gimbal pose, pulse widths, power flags and the status mask.
//! All physical output goes through an [`ActuatorSink`].

use tracing::{debug, info, warn};

use super::calibration::AxisCalibration;
use super::{ActuatorOutput, ActuatorSink, Axis};
use crate::protocol::decoder::FrameValidity;
use crate::protocol::frame::{ANGLE_MAX, ANGLE_MIN};
use crate::protocol::status::StatusMask;

/// Gimbal and laser state, driven through an output sink.
pub struct ActuatorModel<S> {
    sink: S,
    calibration: AxisCalibration,
    /// Pulse width of the mechanical neutral used by the emergency stop
    neutral_us: u16,
    output: ActuatorOutput,
    pwm_x: u16,
    pwm_y: u16,
    status: StatusMask,
}

impl<S: std::fmt::Debug> std::fmt::Debug for ActuatorModel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActuatorModel")
            .field("sink", &self.sink)
            .field("output", &self.output)
            .field("pwm_x", &self.pwm_x)
            .field("pwm_y", &self.pwm_y)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl<S: ActuatorSink> ActuatorModel<S> {
    /// Create the model and drive the outputs to the startup state.
    ///
    /// Both axes go to their calibrated center, the laser is switched off and
    /// the servo power flag starts cleared. The last-frame validity bits start
    /// set, as no bad frame has been seen yet.
    ///
    /// # Arguments
    ///
    /// * `calibration` - Pulse ranges for both axes
    /// * `neutral_us` - Pulse width of the mechanical neutral
    /// * `sink` - Physical output driver
    pub fn new(calibration: AxisCalibration, neutral_us: u16, sink: S) -> Self {
        let mut model = Self {
            sink,
            calibration,
            neutral_us,
            output: ActuatorOutput {
                angle_x: 0,
                angle_y: 0,
                laser_on: false,
                servo_powered: false,
            },
            pwm_x: calibration.x.center_us(),
            pwm_y: calibration.y.center_us(),
            status: StatusMask {
                length_ok: true,
                crc_ok: true,
                ..StatusMask::default()
            },
        };

        model.sink.apply_pwm(Axis::X, model.pwm_x);
        model.sink.apply_pwm(Axis::Y, model.pwm_y);
        model.sink.set_laser_pin(false);
        model
    }

    /// Move one axis to an angle.
    ///
    /// The angle is clamped to -40..=40, converted with the axis calibration
    /// and applied. The axis' PWM-mode bit is cleared.
    pub fn set_angle(&mut self, axis: Axis, angle: i8) {
        let angle = angle.clamp(ANGLE_MIN, ANGLE_MAX);
        let pwm = match axis {
            Axis::X => self.calibration.x.angle_to_pwm(angle),
            Axis::Y => self.calibration.y.angle_to_pwm(angle),
        };

        self.sink.apply_pwm(axis, pwm);
        match axis {
            Axis::X => {
                self.output.angle_x = angle;
                self.pwm_x = pwm;
                self.status.x_pwm_mode = false;
            }
            Axis::Y => {
                self.output.angle_y = angle;
                self.pwm_y = pwm;
                self.status.y_pwm_mode = false;
            }
        }

        debug!("{:?} → {}° ({} µs)", axis, angle, pwm);
    }

    /// Move both axes to an angle pair.
    pub fn move_to(&mut self, x: i8, y: i8) {
        self.set_angle(Axis::X, x);
        self.set_angle(Axis::Y, y);
    }

    /// Drive one axis with a raw pulse width.
    ///
    /// The pulse width is clamped to the axis' calibrated range, the
    /// equivalent angle is recorded, and the axis' PWM-mode bit is set.
    pub fn set_pwm(&mut self, axis: Axis, pwm_us: u16) {
        let calibration = match axis {
            Axis::X => self.calibration.x,
            Axis::Y => self.calibration.y,
        };
        let pwm = calibration.clamp_pwm(pwm_us);
        let angle = calibration.pwm_to_angle(pwm);

        self.sink.apply_pwm(axis, pwm);
        match axis {
            Axis::X => {
                self.output.angle_x = angle;
                self.pwm_x = pwm;
                self.status.x_pwm_mode = true;
            }
            Axis::Y => {
                self.output.angle_y = angle;
                self.pwm_y = pwm;
                self.status.y_pwm_mode = true;
            }
        }

        debug!("{:?} PWM → {} µs ({}°)", axis, pwm, angle);
    }

    /// Switch the laser.
    pub fn set_laser(&mut self, on: bool) {
        self.sink.set_laser_pin(on);
        self.output.laser_on = on;
        self.status.laser_powered = on;
        info!("Laser {}", if on { "ON" } else { "OFF" });
    }

    /// Set the servo power flag.
    ///
    /// This only updates bookkeeping and telemetry; the servo driver stays
    /// attached and keeps holding its last pulse width.
    pub fn set_servo_power(&mut self, on: bool) {
        self.output.servo_powered = on;
        self.status.servo_powered = on;
        info!("Servo power {}", if on { "ON" } else { "OFF" });
    }

    /// Force the safe state.
    ///
    /// Laser off, both servos to the mechanical neutral, angles reset to 0.
    /// The neutral is the configured pulse width, not the calibrated zero.
    pub fn emergency_stop(&mut self) {
        self.sink.set_laser_pin(false);
        self.output.laser_on = false;
        self.status.laser_powered = false;

        self.sink.apply_neutral(self.neutral_us);
        self.output.angle_x = 0;
        self.output.angle_y = 0;
        self.pwm_x = self.neutral_us;
        self.pwm_y = self.neutral_us;

        warn!("EMERGENCY STOP: laser off, servos at neutral ({} µs)", self.neutral_us);
    }

    /// Record the length/CRC outcome of the latest inbound frame.
    pub fn record_validity(&mut self, validity: FrameValidity) {
        self.status.length_ok = validity.length_ok;
        self.status.crc_ok = validity.crc_ok;
    }

    /// Current pose and power flags.
    pub fn output(&self) -> ActuatorOutput {
        self.output
    }

    /// Current angle of one axis.
    pub fn angle(&self, axis: Axis) -> i8 {
        match axis {
            Axis::X => self.output.angle_x,
            Axis::Y => self.output.angle_y,
        }
    }

    /// Pulse width last written to one axis.
    pub fn pwm(&self, axis: Axis) -> u16 {
        match axis {
            Axis::X => self.pwm_x,
            Axis::Y => self.pwm_y,
        }
    }

    /// Live status mask.
    pub fn status(&self) -> StatusMask {
        self.status
    }

    /// Output sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}
