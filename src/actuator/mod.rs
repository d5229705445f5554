//! # Actuator Module
//!
//! Two-axis servo gimbal and laser.
//!
//! This module handles:
//! - Angle ↔ pulse width calibration per axis
//! - Current pose, power flags and the live status mask
//! - The emergency-stop safe state
//! - The output sink boundary to the physical actuator driver

pub mod calibration;
pub mod model;
pub mod sink;

pub use model::ActuatorModel;
pub use sink::TracingSink;

/// Gimbal axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// Physical actuator interface
///
/// The core calls these and never touches hardware registers itself.
#[cfg_attr(test, mockall::automock)]
pub trait ActuatorSink {
    /// Drive one servo with a pulse width in microseconds
    fn apply_pwm(&mut self, axis: Axis, micros: u16);

    /// Drive both servos to the mechanical neutral pulse width
    fn apply_neutral(&mut self, micros: u16);

    /// Switch the laser output
    fn set_laser_pin(&mut self, on: bool);
}

/// Observable actuator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorOutput {
    /// Current X angle in degrees (-40..=40)
    pub angle_x: i8,
    /// Current Y angle in degrees (-40..=40)
    pub angle_y: i8,
    /// Laser on
    pub laser_on: bool,
    /// Servo power flag
    pub servo_powered: bool,
}
