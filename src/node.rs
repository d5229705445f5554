//! # Node
//!
//! The satellite control loop.
//!
//! One [`Node::run_cycle`] call does, in order:
//! 1. Decode and apply every waiting uplink frame
//! 2. Apply a pending emergency stop
//! 3. Run the scan tick
//! 4. Send telemetry if the telemetry period has elapsed
//!
//! All state is owned here and mutated only from the loop; the emergency
//! stop flag is the single value shared with other contexts.

use tracing::{debug, info, warn};

use crate::actuator::calibration::AxisCalibration;
use crate::actuator::{ActuatorModel, ActuatorSink, Axis};
use crate::config::Config;
use crate::link::FrameTransport;
use crate::protocol::decoder::{decode_command, DecodeError, FrameValidity};
use crate::protocol::encoder::encode_telemetry;
use crate::protocol::frame::CommandFrame;
use crate::safety::{EmergencyStop, EmergencyStopTrigger};
use crate::scan::{ScanMode, ScanStateMachine};
use crate::telemetry::{TelemetryBuilder, TelemetryJournal};

/// Link counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub frames_accepted: u64,
    pub frames_rejected: u64,
    pub telemetry_sent: u64,
    pub send_failures: u64,
}

/// Satellite node state and control loop
pub struct Node<S> {
    actuators: ActuatorModel<S>,
    scan: ScanStateMachine,
    telemetry: TelemetryBuilder,
    emergency_stop: EmergencyStop,
    journal: Option<TelemetryJournal>,
    last_command_number: u8,
    telemetry_period_ms: u32,
    last_telemetry_ms: u32,
    period_unit_ms: u32,
    stats: LinkStats,
}

impl<S: std::fmt::Debug> std::fmt::Debug for Node<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("actuators", &self.actuators)
            .field("scan", &self.scan)
            .field("last_command_number", &self.last_command_number)
            .field("telemetry_period_ms", &self.telemetry_period_ms)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<S: ActuatorSink> Node<S> {
    /// Create a node and drive the actuators to their startup state.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `sink` - Physical actuator driver
    /// * `now_ms` - Clock reading; the first telemetry frame goes out one
    ///   telemetry period later
    pub fn new(config: &Config, sink: S, now_ms: u32) -> Self {
        let calibration = AxisCalibration::from_config(&config.servo);
        let actuators = ActuatorModel::new(calibration, config.servo.neutral_us, sink);

        info!(
            "Node initialised: step interval {} ms, telemetry period {} ms",
            config.scan.step_interval_ms, config.telemetry.period_ms
        );

        Self {
            actuators,
            scan: ScanStateMachine::new(config.scan.step_interval_ms, now_ms),
            telemetry: TelemetryBuilder::new(),
            emergency_stop: EmergencyStop::new(),
            journal: None,
            last_command_number: 0,
            telemetry_period_ms: config.telemetry.period_ms.max(1),
            last_telemetry_ms: now_ms,
            period_unit_ms: config.scan.period_unit_ms.max(1),
            stats: LinkStats::default(),
        }
    }

    /// Journal every telemetry frame sent from now on
    pub fn with_journal(mut self, journal: TelemetryJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Handle for raising the emergency stop from another context
    pub fn emergency_stop_trigger(&self) -> EmergencyStopTrigger {
        self.emergency_stop.trigger_handle()
    }

    /// Run one control loop iteration.
    pub fn run_cycle<T: FrameTransport>(&mut self, transport: &mut T, now_ms: u32) {
        while let Some(bytes) = transport.receive_frame() {
            // Rejections are counted and logged inside
            let _ = self.handle_frame(&bytes, now_ms);
        }

        if self.emergency_stop.take() {
            self.apply_emergency_stop(now_ms);
        }

        self.scan.tick(&mut self.actuators, now_ms);

        if now_ms.wrapping_sub(self.last_telemetry_ms) >= self.telemetry_period_ms {
            self.send_telemetry(transport, now_ms);
        }
    }

    /// Decode one uplink frame and apply it.
    ///
    /// The frame's length/CRC outcome is written into the status mask
    /// whether or not it decodes.
    ///
    /// # Errors
    ///
    /// Returns the decode error for a rejected frame. Nothing is applied.
    pub fn handle_frame(&mut self, bytes: &[u8], now_ms: u32) -> Result<(), DecodeError> {
        let result = decode_command(bytes);
        self.actuators.record_validity(FrameValidity::of(&result));

        match result {
            Ok(command) => {
                self.stats.frames_accepted += 1;
                self.last_command_number = command.packet_number;
                debug!("Command #{} accepted", command.packet_number);
                self.apply_command(&command, now_ms);
                Ok(())
            }
            Err(e) => {
                self.stats.frames_rejected += 1;
                warn!("Rejected uplink frame: {}", e);
                Err(e)
            }
        }
    }

    /// Apply a decoded command.
    ///
    /// Fields are applied in wire order: script, step period, telemetry
    /// period, servo power, laser power, PWM, angle. Absent fields are left
    /// untouched. Direct PWM or angle fields without a recognised script
    /// code switch the scan into `Manual`.
    pub fn apply_command(&mut self, command: &CommandFrame, now_ms: u32) {
        let scripted = command
            .script
            .and_then(|code| self.scan.dispatch_script_code(code, &mut self.actuators, now_ms))
            .is_some();

        if let Some(period) = command.step_period.filter(|p| *p > 0) {
            self.scan.set_step_interval_ms(u32::from(period).saturating_mul(self.period_unit_ms));
        }

        if let Some(period) = command.telemetry_period.filter(|p| *p > 0) {
            self.telemetry_period_ms = u32::from(period).saturating_mul(self.period_unit_ms);
            info!("Telemetry period set to {} ms", self.telemetry_period_ms);
        }

        if let Some(on) = command.servo_power {
            self.actuators.set_servo_power(on);
        }

        if let Some(on) = command.laser_power {
            self.actuators.set_laser(on);
        }

        if !scripted && command.has_direct_position() {
            self.scan.enter(ScanMode::Manual, &mut self.actuators, now_ms);
        }

        if let Some(pwm) = command.pwm_x {
            self.actuators.set_pwm(Axis::X, pwm);
        }
        if let Some(pwm) = command.pwm_y {
            self.actuators.set_pwm(Axis::Y, pwm);
        }
        if let Some(angle) = command.angle_x {
            self.actuators.set_angle(Axis::X, angle);
        }
        if let Some(angle) = command.angle_y {
            self.actuators.set_angle(Axis::Y, angle);
        }
    }

    /// Drive everything to the safe state before exit.
    ///
    /// Laser off, servos to neutral, scan idle.
    pub fn shutdown(&mut self, now_ms: u32) {
        info!("Shutting down: laser off, servos to neutral");
        self.scan.stop_all(&mut self.actuators, now_ms);
        self.actuators.emergency_stop();
    }

    fn apply_emergency_stop(&mut self, now_ms: u32) {
        self.actuators.emergency_stop();
        self.scan.enter(ScanMode::Idle, &mut self.actuators, now_ms);
    }

    fn send_telemetry<T: FrameTransport>(&mut self, transport: &mut T, now_ms: u32) {
        self.last_telemetry_ms = now_ms;

        let frame = self
            .telemetry
            .build(&self.actuators, &self.scan, self.last_command_number, now_ms);
        let bytes = encode_telemetry(&frame);

        if transport.send_frame(&bytes) {
            self.stats.telemetry_sent += 1;
            debug!("Telemetry #{} queued", frame.packet_number);
        } else {
            self.stats.send_failures += 1;
            warn!("Telemetry #{} send failed", frame.packet_number);
        }

        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = journal.record(&frame) {
                warn!("Telemetry journal write failed: {}", e);
            }
        }
    }

    pub fn actuators(&self) -> &ActuatorModel<S> {
        &self.actuators
    }

    pub fn scan(&self) -> &ScanStateMachine {
        &self.scan
    }

    /// Packet number of the last accepted command
    pub fn last_command_number(&self) -> u8 {
        self.last_command_number
    }

    pub fn telemetry_period_ms(&self) -> u32 {
        self.telemetry_period_ms
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }
}
