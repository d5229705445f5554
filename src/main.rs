//! # Gimbal Link
//!
//! Satellite-side node process for a two-axis laser gimbal.
//!
//! Reads 24-byte command frames from the radio modem, drives the gimbal
//! and scan patterns, and sends telemetry frames back on a fixed period.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use gimbal_link::actuator::TracingSink;
use gimbal_link::config::{Config, LoggingConfig};
use gimbal_link::link::{Clock, FrameAssembler, MonotonicClock, QueuedTransport, RadioSerial};
use gimbal_link::node::Node;
use gimbal_link::safety::EmergencyStopTrigger;
use gimbal_link::telemetry::TelemetryJournal;

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Serial read buffer size in bytes
const SERIAL_READ_BUFFER_LEN: usize = 256;

/// Time between link status log messages
const STATUS_LOG_INTERVAL_MS: u32 = 10_000;

/// Rolling log file name prefix
const LOG_FILE_PREFIX: &str = "gimbal-link.log";

/// Main entry point for the Gimbal Link node
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (built-in defaults if the file is absent)
///    - Set up logging
///    - Open the radio modem serial port
///    - Install the SIGUSR1 emergency-stop listener (Unix)
///
/// 2. **Main Loop**
///    - Every control cycle: flush stale partial frames, run the node cycle,
///      write queued telemetry to the modem
///    - On serial data: reassemble and queue command frames
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Laser off, servos to neutral, scan idle
///    - Log link counters
///
/// # Errors
///
/// Returns error if the configuration file is invalid or no radio modem
/// can be opened
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config_path_from_args(std::env::args());
    let (config, loaded) = load_config(&config_path)?;

    let _log_guard = init_logging(&config.logging);

    info!("Gimbal Link v{} starting...", env!("CARGO_PKG_VERSION"));
    if loaded {
        info!("Loaded configuration from {}", config_path.display());
    } else {
        warn!("{} not found, using built-in defaults", config_path.display());
    }

    let mut serial = match RadioSerial::open(&config.serial) {
        Ok(serial) => serial,
        Err(e) => {
            error!("Failed to open radio modem: {}", e);
            return Err(e.into());
        }
    };
    info!("Radio modem opened at: {}", serial.device_path());

    let clock = MonotonicClock::new();
    let mut node = Node::new(&config, TracingSink::new(), clock.now_millis());

    if config.telemetry.journal_enabled {
        match TelemetryJournal::from_config(&config.telemetry) {
            Ok(journal) => node = node.with_journal(journal),
            Err(e) => warn!("Telemetry journal disabled: {}", e),
        }
    }

    spawn_emergency_stop_listener(node.emergency_stop_trigger())?;

    let mut transport = QueuedTransport::default();
    let mut assembler = FrameAssembler::new();
    let mut read_buf = [0u8; SERIAL_READ_BUFFER_LEN];
    let serial_timeout_ms = u32::try_from(config.serial.timeout_ms).unwrap_or(u32::MAX);

    let mut cycle = interval(Duration::from_millis(config.control.cycle_ms));
    cycle.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_status_ms = clock.now_millis();

    info!("Control loop running every {} ms", config.control.cycle_ms);
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = cycle.tick() => {
                let now = clock.now_millis();

                if let Some(fragment) = assembler.flush_stale(now, serial_timeout_ms) {
                    transport.push_inbound(fragment);
                }

                node.run_cycle(&mut transport, now);

                while let Some(frame) = transport.pop_outbound() {
                    if let Err(e) = serial.send_frame(&frame).await {
                        warn!("{}", e);
                    }
                }

                if now.wrapping_sub(last_status_ms) >= STATUS_LOG_INTERVAL_MS {
                    let stats = node.stats();
                    info!(
                        "Link: {} accepted, {} rejected, {} telemetry sent, {} send failures",
                        stats.frames_accepted,
                        stats.frames_rejected,
                        stats.telemetry_sent,
                        stats.send_failures
                    );
                    last_status_ms = now;
                }
            }

            result = serial.read_chunk(&mut read_buf) => {
                match result {
                    Ok(n) => {
                        assembler.push(&read_buf[..n], clock.now_millis());
                        while let Some(frame) = assembler.next_frame() {
                            transport.push_inbound(frame);
                        }
                    }
                    Err(e) => {
                        error!("Radio link lost: {}", e);
                        break;
                    }
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    node.shutdown(clock.now_millis());

    let stats = node.stats();
    info!(
        "Total: {} commands accepted, {} rejected, {} telemetry frames sent",
        stats.frames_accepted, stats.frames_rejected, stats.telemetry_sent
    );

    Ok(())
}

/// Config path from the first command-line argument
fn config_path_from_args<I: IntoIterator<Item = String>>(args: I) -> PathBuf {
    args.into_iter()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load the config file, or built-in defaults if it does not exist.
///
/// The flag is `true` when the file was read.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }

    let config = Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok((config, true))
}

/// Initialize logging.
///
/// `RUST_LOG` overrides the configured level. With file logging enabled a
/// daily rolling file is written through a non-blocking writer; the returned
/// guard must live until exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));

    if config.file_enabled {
        let appender = tracing_appender::rolling::daily(&config.file_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
        None
    }
}

/// Raise the emergency stop on SIGUSR1.
///
/// The listener task only sets the atomic flag; the control loop applies
/// the stop on its next cycle.
#[cfg(unix)]
fn spawn_emergency_stop_listener(trigger: EmergencyStopTrigger) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;

    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            trigger.trigger();
            warn!("SIGUSR1 received: emergency stop requested");
        }
    });

    info!("Send SIGUSR1 to trigger an emergency stop");
    Ok(())
}

#[cfg(not(unix))]
fn spawn_emergency_stop_listener(_trigger: EmergencyStopTrigger) -> Result<()> {
    warn!("Emergency stop signal not supported on this platform");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(
            config_path_from_args(args(&["gimbal-link"])),
            PathBuf::from("config/default.toml")
        );
    }

    #[test]
    fn test_config_path_from_argument() {
        assert_eq!(
            config_path_from_args(args(&["gimbal-link", "/etc/gimbal.toml"])),
            PathBuf::from("/etc/gimbal.toml")
        );
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let (config, loaded) = load_config(Path::new("/nonexistent/gimbal.toml")).unwrap();
        assert!(!loaded);
        assert_eq!(config.scan.step_interval_ms, 300);
    }

    #[test]
    fn test_config_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[control]\ncycle_ms = 20\n").unwrap();
        file.flush().unwrap();

        let (config, loaded) = load_config(file.path()).unwrap();
        assert!(loaded);
        assert_eq!(config.control.cycle_ms, 20);
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[control]\ncycle_ms = 0\n").unwrap();
        file.flush().unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_status_interval() {
        assert_eq!(STATUS_LOG_INTERVAL_MS, 10_000);
        assert!(SERIAL_READ_BUFFER_LEN >= 24);
    }
}
