//! # Scan State Machine
//!
//! Owns the scan mode, target pose, step counter and step timer, and moves
//! the gimbal through the [`ActuatorModel`] on each elapsed step interval.

use tracing::{debug, info};

use super::{ScanMode, ScriptCode};
use crate::actuator::{ActuatorModel, ActuatorSink};
use crate::protocol::frame::{ANGLE_MAX, ANGLE_MIN};

/// Default time between scan steps in milliseconds
pub const DEFAULT_STEP_INTERVAL_MS: u32 = 300;

/// Target change per scan step in degrees
pub const SCAN_STEP_DEGREES: i16 = 10;

/// Scan mode controller.
///
/// Starts in `Idle` with a centered target. The state machine never writes
/// actuator state directly; it only commands target poses.
#[derive(Debug, Clone)]
pub struct ScanStateMachine {
    mode: ScanMode,
    target_x: i8,
    target_y: i8,
    step: u8,
    last_step_ms: u32,
    step_interval_ms: u32,
    auto_scan: bool,
}

impl ScanStateMachine {
    /// Create an idle state machine.
    ///
    /// # Arguments
    ///
    /// * `step_interval_ms` - Time between steps; zero falls back to the default
    /// * `now_ms` - Current clock reading
    pub fn new(step_interval_ms: u32, now_ms: u32) -> Self {
        Self {
            mode: ScanMode::Idle,
            target_x: 0,
            target_y: 0,
            step: 0,
            last_step_ms: now_ms,
            step_interval_ms: if step_interval_ms == 0 {
                DEFAULT_STEP_INTERVAL_MS
            } else {
                step_interval_ms
            },
            auto_scan: false,
        }
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Current target pose (x, y)
    pub fn target(&self) -> (i8, i8) {
        (self.target_x, self.target_y)
    }

    /// Steps taken since the last state entry
    pub fn step(&self) -> u8 {
        self.step
    }

    pub fn step_interval_ms(&self) -> u32 {
        self.step_interval_ms
    }

    /// Change the step interval; zero is ignored.
    pub fn set_step_interval_ms(&mut self, interval_ms: u32) {
        if interval_ms == 0 {
            return;
        }
        self.step_interval_ms = interval_ms;
        info!("Scan step interval set to {} ms", interval_ms);
    }

    /// Whether autonomous ticking is enabled
    pub fn is_auto_scanning(&self) -> bool {
        self.auto_scan
    }

    /// Enter a state and run its entry action.
    ///
    /// Entering the current state again is a no-op. Every real entry resets
    /// the step counter and restarts the step timer.
    pub fn enter<S: ActuatorSink>(&mut self, mode: ScanMode, actuators: &mut ActuatorModel<S>, now_ms: u32) {
        if self.mode == mode {
            return;
        }

        info!("Scan state: {:?} → {:?}", self.mode, mode);

        self.mode = mode;
        self.step = 0;
        self.last_step_ms = now_ms;

        match mode {
            ScanMode::Idle => {
                self.auto_scan = false;
                actuators.set_servo_power(false);
            }
            ScanMode::Manual => {
                self.auto_scan = false;
            }
            scanning => {
                if let Some((x, y)) = scanning.start_pose() {
                    self.auto_scan = true;
                    actuators.set_servo_power(true);
                    self.target_x = x;
                    self.target_y = y;
                    actuators.move_to(x, y);
                }
            }
        }
    }

    /// Run one scan step if autonomous ticking is on and the step interval
    /// has elapsed.
    ///
    /// Elapsed time uses wrapping subtraction, so a clock rollover does not
    /// stall the scan.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether a step was executed
    pub fn tick<S: ActuatorSink>(&mut self, actuators: &mut ActuatorModel<S>, now_ms: u32) -> bool {
        if !self.auto_scan {
            return false;
        }

        if now_ms.wrapping_sub(self.last_step_ms) < self.step_interval_ms {
            return false;
        }

        self.execute_step(actuators, now_ms);
        self.last_step_ms = now_ms;
        true
    }

    fn execute_step<S: ActuatorSink>(&mut self, actuators: &mut ActuatorModel<S>, now_ms: u32) {
        self.step = self.step.wrapping_add(1);

        let (dx, dy, next) = match self.mode {
            ScanMode::ScanHorizontal => (0, SCAN_STEP_DEGREES, ScanMode::ScanVertical),
            ScanMode::ScanVertical => (SCAN_STEP_DEGREES, 0, ScanMode::ScanDiagonal1),
            ScanMode::ScanDiagonal1 => (SCAN_STEP_DEGREES, SCAN_STEP_DEGREES, ScanMode::ScanDiagonal2),
            ScanMode::ScanDiagonal2 => (SCAN_STEP_DEGREES, -SCAN_STEP_DEGREES, ScanMode::Idle),
            ScanMode::Idle | ScanMode::Manual => return,
        };

        let x = i16::from(self.target_x) + dx;
        let y = i16::from(self.target_y) + dy;

        if !in_range(x) || !in_range(y) {
            if next == ScanMode::Idle {
                info!("Scan complete");
            }
            self.enter(next, actuators, now_ms);
            return;
        }

        self.target_x = x as i8;
        self.target_y = y as i8;
        debug!("[Step {}] {:?}: X={} Y={}", self.step, self.mode, self.target_x, self.target_y);
        actuators.move_to(self.target_x, self.target_y);
    }

    /// Go idle and switch laser and servo power off.
    pub fn stop_all<S: ActuatorSink>(&mut self, actuators: &mut ActuatorModel<S>, now_ms: u32) {
        self.enter(ScanMode::Idle, actuators, now_ms);
        actuators.set_laser(false);
        actuators.set_servo_power(false);
        info!("Stop: all actions halted");
    }

    /// Apply an uplink script code.
    ///
    /// Scan codes enter their state and switch the laser on; code 2 stops
    /// everything; unknown codes are ignored.
    ///
    /// # Returns
    ///
    /// * `Option<ScriptCode>` - The recognised code, `None` if ignored
    pub fn dispatch_script_code<S: ActuatorSink>(
        &mut self,
        code: u8,
        actuators: &mut ActuatorModel<S>,
        now_ms: u32,
    ) -> Option<ScriptCode> {
        let Some(script) = ScriptCode::from_code(code) else {
            debug!("Ignoring unknown script code {}", code);
            return None;
        };

        info!("Script command #{} ({:?})", code, script);

        match script.scan_mode() {
            Some(mode) => {
                self.enter(mode, actuators, now_ms);
                actuators.set_laser(true);
            }
            None => self.stop_all(actuators, now_ms),
        }

        Some(script)
    }
}

fn in_range(angle: i16) -> bool {
    (i16::from(ANGLE_MIN)..=i16::from(ANGLE_MAX)).contains(&angle)
}
