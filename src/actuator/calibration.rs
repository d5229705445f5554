//! # Servo Calibration Module
//!
//! Maps gimbal angles to servo pulse widths and back.
//!
//! ## Angle Mapping
//!
//! Each axis is mapped piecewise-linearly through its calibrated zero:
//! -40..=0 degrees onto `min_us..=center_us` and 0..=40 degrees onto
//! `center_us..=max_us`.
//!
//! `pwm = min_us + (angle + 40) * (center_us - min_us) / 40` below zero
//! `pwm = center_us + angle * (max_us - center_us) / 40` from zero up
//!
//! The forward map truncates like a standard integer range remap. The
//! inverse rounds to the nearest degree, so every angle survives an
//! angle → PWM → angle round trip and -40, 0 and +40 map exactly onto min, center and max:
//!
//! | Angle | X axis | Y axis |
//! |-------|--------|--------|
//! | -40°  | 1000   | 1100   |
//! | 0°    | 1500   | 1600   |
//! | +40°  | 2000   | 2100   |
//!
//! ## Usage
//!
//! ```
//! use gimbal_link::actuator::calibration::ServoCalibration;
//!
//! let cal = ServoCalibration::new(1000, 2000, 1500);
//!
//! assert_eq!(cal.angle_to_pwm(0), 1500);
//! assert_eq!(cal.pwm_to_angle(2000), 40);
//! ```

use crate::protocol::frame::{ANGLE_MAX, ANGLE_MIN};

/// Degrees covered by each half of the range
const HALF_ANGLE_SPAN: i32 = ANGLE_MAX as i32;

/// Pulse range of a single servo axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoCalibration {
    /// Pulse width at -40 degrees (µs).
    min_us: u16,
    /// Pulse width at +40 degrees (µs).
    max_us: u16,
    /// Pulse width at 0 degrees, written at startup (µs).
    center_us: u16,
}

impl ServoCalibration {
    /// Creates a calibration for one axis.
    ///
    /// `min_us` and `max_us` are swapped if given in the wrong order, and
    /// `center_us` is clamped into the range.
    #[must_use]
    pub fn new(min_us: u16, max_us: u16, center_us: u16) -> Self {
        let (min_us, max_us) = if min_us <= max_us { (min_us, max_us) } else { (max_us, min_us) };
        Self {
            min_us,
            max_us,
            center_us: center_us.clamp(min_us, max_us),
        }
    }

    /// Returns the pulse width at -40 degrees.
    #[must_use]
    pub fn min_us(&self) -> u16 {
        self.min_us
    }

    /// Returns the pulse width at +40 degrees.
    #[must_use]
    pub fn max_us(&self) -> u16 {
        self.max_us
    }

    /// Returns the calibrated zero pulse width.
    #[must_use]
    pub fn center_us(&self) -> u16 {
        self.center_us
    }

    /// Clamps a pulse width into the calibrated range.
    #[must_use]
    pub fn clamp_pwm(&self, pwm_us: u16) -> u16 {
        pwm_us.clamp(self.min_us, self.max_us)
    }

    /// Converts an angle to a pulse width.
    ///
    /// # Arguments
    ///
    /// * `angle` - Angle in degrees, clamped to -40..=40
    ///
    /// # Returns
    ///
    /// Pulse width in microseconds within `min_us..=max_us`
    #[must_use]
    pub fn angle_to_pwm(&self, angle: i8) -> u16 {
        let angle = i32::from(angle.clamp(ANGLE_MIN, ANGLE_MAX));
        let pwm = if angle < 0 {
            i32::from(self.min_us) + (angle + HALF_ANGLE_SPAN) * self.lower_span() / HALF_ANGLE_SPAN
        } else {
            i32::from(self.center_us) + angle * self.upper_span() / HALF_ANGLE_SPAN
        };
        pwm as u16
    }

    /// Converts a pulse width to the nearest angle.
    ///
    /// # Arguments
    ///
    /// * `pwm_us` - Pulse width in microseconds, clamped to the calibrated range
    ///
    /// # Returns
    ///
    /// Angle in degrees within -40..=40
    #[must_use]
    pub fn pwm_to_angle(&self, pwm_us: u16) -> i8 {
        let pwm = self.clamp_pwm(pwm_us);
        let (base, half, origin) = if pwm < self.center_us {
            (self.min_us, self.lower_span(), i32::from(ANGLE_MIN))
        } else {
            (self.center_us, self.upper_span(), 0)
        };
        if half == 0 {
            return 0;
        }

        let offset = i32::from(pwm) - i32::from(base);
        // Round half up: floor(offset * 40 / half + 1/2)
        let degrees = (2 * offset * HALF_ANGLE_SPAN + half) / (2 * half);
        (degrees + origin) as i8
    }

    fn lower_span(&self) -> i32 {
        i32::from(self.center_us) - i32::from(self.min_us)
    }

    fn upper_span(&self) -> i32 {
        i32::from(self.max_us) - i32::from(self.center_us)
    }
}

/// Calibration for both gimbal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCalibration {
    /// Horizontal axis.
    pub x: ServoCalibration,
    /// Vertical axis.
    pub y: ServoCalibration,
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self {
            x: ServoCalibration::new(1000, 2000, 1500),
            y: ServoCalibration::new(1100, 2100, 1600),
        }
    }
}

impl AxisCalibration {
    /// Creates axis calibration from the `[servo]` config section.
    ///
    /// # Examples
    ///
    /// ```
    /// use gimbal_link::actuator::calibration::AxisCalibration;
    /// use gimbal_link::config::ServoConfig;
    ///
    /// let cal = AxisCalibration::from_config(&ServoConfig::default());
    /// assert_eq!(cal.y.angle_to_pwm(-40), 1100);
    /// ```
    #[must_use]
    pub fn from_config(servo: &crate::config::ServoConfig) -> Self {
        Self {
            x: ServoCalibration::new(servo.x_min_us, servo.x_max_us, servo.x_center_us),
            y: ServoCalibration::new(servo.y_min_us, servo.y_max_us, servo.y_center_us),
        }
    }
}
