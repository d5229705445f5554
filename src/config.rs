//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field has a default, so a partial file (or no file at
//! all, via [`Config::default`]) yields a usable configuration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{GimbalLinkError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub servo: ServoConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub control: ControlConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Radio modem serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Silence after which a partial frame is flushed and rejected
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Servo calibration (pulse widths in microseconds)
#[derive(Debug, Deserialize, Clone)]
pub struct ServoConfig {
    #[serde(default = "default_x_min_us")]
    pub x_min_us: u16,

    #[serde(default = "default_x_max_us")]
    pub x_max_us: u16,

    #[serde(default = "default_x_center_us")]
    pub x_center_us: u16,

    #[serde(default = "default_y_min_us")]
    pub y_min_us: u16,

    #[serde(default = "default_y_max_us")]
    pub y_max_us: u16,

    #[serde(default = "default_y_center_us")]
    pub y_center_us: u16,

    /// Mechanical neutral used by the emergency stop
    #[serde(default = "default_neutral_us")]
    pub neutral_us: u16,
}

/// Scan pattern timing
#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u32,

    /// Milliseconds per unit of the uplink period bytes
    #[serde(default = "default_period_unit_ms")]
    pub period_unit_ms: u32,
}

/// Telemetry downlink and journal configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_period_ms")]
    pub period_ms: u32,

    #[serde(default)]
    pub journal_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub file_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_timeout_ms() -> u64 { 100 }

fn default_x_min_us() -> u16 { 1000 }
fn default_x_max_us() -> u16 { 2000 }
fn default_x_center_us() -> u16 { 1500 }
fn default_y_min_us() -> u16 { 1100 }
fn default_y_max_us() -> u16 { 2100 }
fn default_y_center_us() -> u16 { 1600 }
fn default_neutral_us() -> u16 { 1500 }

fn default_step_interval_ms() -> u32 { 300 }
fn default_period_unit_ms() -> u32 { 10 }

fn default_telemetry_period_ms() -> u32 { 1000 }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

fn default_cycle_ms() -> u64 { 10 }

fn default_log_level() -> String { "info".to_string() }

/// Supported radio modem baud rates
const VALID_BAUD_RATES: [u32; 6] = [9600, 19200, 38400, 57600, 115200, 230400];

/// Accepted logging levels
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepted servo pulse width range in microseconds
const SERVO_PULSE_RANGE_US: std::ops::RangeInclusive<u16> = 500..=2500;

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            x_min_us: default_x_min_us(),
            x_max_us: default_x_max_us(),
            x_center_us: default_x_center_us(),
            y_min_us: default_y_min_us(),
            y_max_us: default_y_max_us(),
            y_center_us: default_y_center_us(),
            neutral_us: default_neutral_us(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: default_step_interval_ms(),
            period_unit_ms: default_period_unit_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            period_ms: default_telemetry_period_ms(),
            journal_enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            cycle_ms: default_cycle_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_enabled: false,
            file_dir: default_log_dir(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> GimbalLinkError {
    GimbalLinkError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gimbal_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first out-of-range value
    pub fn validate(&self) -> Result<()> {
        // Serial
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400",
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        // Servo calibration
        let servo = &self.servo;
        for (name, value) in [
            ("x_min_us", servo.x_min_us),
            ("x_max_us", servo.x_max_us),
            ("x_center_us", servo.x_center_us),
            ("y_min_us", servo.y_min_us),
            ("y_max_us", servo.y_max_us),
            ("y_center_us", servo.y_center_us),
            ("neutral_us", servo.neutral_us),
        ] {
            if !SERVO_PULSE_RANGE_US.contains(&value) {
                return Err(invalid(format!("{} must be between 500 and 2500", name)));
            }
        }

        for (axis, min, center, max) in [
            ("x", servo.x_min_us, servo.x_center_us, servo.x_max_us),
            ("y", servo.y_min_us, servo.y_center_us, servo.y_max_us),
        ] {
            if !(min < center && center < max) {
                return Err(invalid(format!(
                    "{axis}_min_us < {axis}_center_us < {axis}_max_us must hold",
                    axis = axis
                )));
            }
        }

        // Scan timing
        if self.scan.step_interval_ms == 0 || self.scan.step_interval_ms > 60000 {
            return Err(invalid("step_interval_ms must be between 1 and 60000"));
        }

        if self.scan.period_unit_ms == 0 || self.scan.period_unit_ms > 1000 {
            return Err(invalid("period_unit_ms must be between 1 and 1000"));
        }

        // Telemetry
        if self.telemetry.period_ms == 0 || self.telemetry.period_ms > 60000 {
            return Err(invalid("telemetry period_ms must be between 1 and 60000"));
        }

        if self.telemetry.journal_enabled {
            if self.telemetry.log_dir.is_empty() {
                return Err(invalid("telemetry log_dir cannot be empty when journal is enabled"));
            }

            if self.telemetry.max_records_per_file == 0 {
                return Err(invalid("max_records_per_file must be greater than 0"));
            }

            if self.telemetry.max_files_to_keep == 0 {
                return Err(invalid("max_files_to_keep must be greater than 0"));
            }
        }

        // Control loop
        if self.control.cycle_ms == 0 || self.control.cycle_ms > 1000 {
            return Err(invalid("cycle_ms must be between 1 and 1000"));
        }

        // Logging
        if !VALID_LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid("logging level must be one of: trace, debug, info, warn, error"));
        }

        if self.logging.file_enabled && self.logging.file_dir.is_empty() {
            return Err(invalid("logging file_dir cannot be empty when file logging is enabled"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> Config {
        Config {
            serial: SerialConfig {
                port: default_serial_port(),
                baud_rate: default_baud_rate(),
                timeout_ms: default_timeout_ms(),
            },
            servo: ServoConfig {
                x_min_us: default_x_min_us(),
                x_max_us: default_x_max_us(),
                x_center_us: default_x_center_us(),
                y_min_us: default_y_min_us(),
                y_max_us: default_y_max_us(),
                y_center_us: default_y_center_us(),
                neutral_us: default_neutral_us(),
            },
            scan: ScanConfig {
                step_interval_ms: default_step_interval_ms(),
                period_unit_ms: default_period_unit_ms(),
            },
            telemetry: TelemetryConfig {
                period_ms: default_telemetry_period_ms(),
                journal_enabled: true,
                log_dir: default_log_dir(),
                max_records_per_file: default_max_records_per_file(),
                max_files_to_keep: default_max_files_to_keep(),
            },
            control: ControlConfig {
                cycle_ms: default_cycle_ms(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                file_enabled: false,
                file_dir: default_log_dir(),
            },
        }
    }

    fn load_str(toml_content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.servo.x_center_us, 1500);
        assert_eq!(config.servo.y_center_us, 1600);
        assert_eq!(config.servo.neutral_us, 1500);
        assert_eq!(config.scan.step_interval_ms, 300);
        assert_eq!(config.scan.period_unit_ms, 10);
        assert_eq!(config.telemetry.period_ms, 1000);
        assert!(!config.telemetry.journal_enabled);
        assert_eq!(config.control.cycle_ms, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[serial]
port = "/dev/ttyAMA0"
baud_rate = 57600

[servo]
y_center_us = 1650

[scan]
step_interval_ms = 500
"#;

        let result = load_str(toml_content);
        assert!(result.is_ok(), "Failed to load config: {:?}", result.as_ref().err());

        let config = result.unwrap();
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.serial.timeout_ms, 100);
        assert_eq!(config.servo.y_center_us, 1650);
        assert_eq!(config.servo.y_min_us, 1100);
        assert_eq!(config.scan.step_interval_ms, 500);

        let cal = crate::actuator::calibration::AxisCalibration::from_config(&config.servo);
        assert_eq!(cal.y.angle_to_pwm(0), 1650);
        assert_eq!(cal.y.pwm_to_angle(1650), 0);
        assert_eq!(config.telemetry.period_ms, 1000);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let config = load_str("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.control.cycle_ms, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/gimbal-link.toml");
        assert!(matches!(result, Err(GimbalLinkError::Io(_))));
    }

    #[test]
    fn test_load_malformed_toml() {
        let result = load_str("[serial\nport = ");
        assert!(matches!(result, Err(GimbalLinkError::Config(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let result = load_str("[serial]\nbaud_rate = 420000\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_baud_rates() {
        let mut config = create_valid_config();
        for baud in VALID_BAUD_RATES {
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "baud {} should be accepted", baud);
        }

        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let mut config = create_valid_config();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 10001;
        assert!(config.validate().is_err());
        config.serial.timeout_ms = 10000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_servo_pulse_out_of_range() {
        let mut config = create_valid_config();
        config.servo.x_min_us = 499;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.servo.neutral_us = 2501;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_servo_center_must_be_inside_range() {
        let mut config = create_valid_config();
        config.servo.x_center_us = config.servo.x_max_us;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.servo.y_min_us = 2100;
        config.servo.y_max_us = 1100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scan_timing_bounds() {
        let mut config = create_valid_config();
        config.scan.step_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.scan.period_unit_ms = 0;
        assert!(config.validate().is_err());

        let mut config = create_valid_config();
        config.scan.period_unit_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_telemetry_period_bounds() {
        let mut config = create_valid_config();
        config.telemetry.period_ms = 0;
        assert!(config.validate().is_err());
        config.telemetry.period_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_journal_limits_only_checked_when_enabled() {
        let mut config = create_valid_config();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());

        config.telemetry.journal_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_journal_requires_log_dir() {
        let mut config = create_valid_config();
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cycle_bounds() {
        let mut config = create_valid_config();
        config.control.cycle_ms = 0;
        assert!(config.validate().is_err());
        config.control.cycle_ms = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_logging_requires_dir() {
        let mut config = create_valid_config();
        config.logging.file_enabled = true;
        config.logging.file_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_default_toml_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let result = Config::load(&path);
        assert!(result.is_ok(), "config/default.toml invalid: {:?}", result.as_ref().err());
    }
}
