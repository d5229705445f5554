//! # Radio Serial
//!
//! Handles serial communication with the radio modem.
//!
//! This module handles:
//! - Opening the modem serial port (8N1) at the configured baud rate
//! - Falling back to common device paths when the configured one fails
//! - Async frame writes and raw byte reads

use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use super::port_trait::{SerialPortIO, StreamPort, TokioSerialPort};
use crate::config::SerialConfig;
use crate::error::{GimbalLinkError, Result};
use crate::protocol::frame::Frame;

/// Device paths tried after the configured one (in order of preference)
const FALLBACK_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC modems
];

/// Radio modem serial port handler
pub struct RadioSerial<P = TokioSerialPort> {
    /// Serial port handle
    port: P,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl<P> std::fmt::Debug for RadioSerial<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadioSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl RadioSerial<TokioSerialPort> {
    /// Open the radio modem from the `[serial]` config section.
    ///
    /// Tries the configured port first, then the fallback paths.
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if no path could be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gimbal_link::config::Config;
    /// use gimbal_link::link::RadioSerial;
    ///
    /// let config = Config::default();
    /// let serial = RadioSerial::open(&config.serial)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths: Vec<&str> = vec![config.port.as_str()];
        paths.extend(FALLBACK_DEVICE_PATHS.iter().copied().filter(|p| *p != config.port));
        Self::open_with_paths(&paths, config.baud_rate)
    }

    /// Open the radio modem trying each path in turn
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    ///
    /// # Returns
    ///
    /// * `Result<RadioSerial>` - Connected serial port or error
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened radio modem at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port: StreamPort::new(port),
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                }
            }
        }

        Err(GimbalLinkError::SerialPortNotFound(paths.join(", ")))
    }

    /// Open a specific serial port with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| GimbalLinkError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }
}

impl<P: SerialPortIO> RadioSerial<P> {
    /// Wrap an already-open port
    pub fn from_port(port: P, device_path: impl Into<String>) -> Self {
        Self {
            port,
            device_path: device_path.into(),
        }
    }

    /// Send one 24-byte frame to the modem
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the write or flush fails
    pub async fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        self.port
            .write_all(frame)
            .await
            .map_err(|e| GimbalLinkError::Serial(format!("Failed to write frame: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| GimbalLinkError::Serial(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent frame ({} bytes)", frame.len());
        Ok(())
    }

    /// Read whatever bytes are available.
    ///
    /// Cancel-safe: no bytes are lost if the future is dropped before it
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns `Serial` on a read failure or when the port reports EOF
    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .port
            .read(buf)
            .await
            .map_err(|e| GimbalLinkError::Serial(format!("Failed to read serial port: {}", e)))?;

        if n == 0 {
            return Err(GimbalLinkError::Serial(format!("{} closed", self.device_path)));
        }
        Ok(n)
    }

    /// Path of the opened serial device
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder::encode_command;
    use crate::protocol::frame::CommandFrame;
    use tokio_test::io::Builder;

    #[test]
    fn test_fallback_paths() {
        assert_eq!(FALLBACK_DEVICE_PATHS, &["/dev/ttyUSB0", "/dev/ttyACM0"]);
    }

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = RadioSerial::open_with_paths(invalid_paths, 115200);

        match result {
            Err(GimbalLinkError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other.err()),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let result = RadioSerial::open_with_paths(&[], 115200);
        assert!(matches!(result, Err(GimbalLinkError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = RadioSerial::open_port("/dev/nonexistent_serial_device_12345", 115200);

        match result {
            Err(GimbalLinkError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other.err()),
        }
    }

    #[test]
    fn test_open_from_config_tries_configured_port_first() {
        let config = SerialConfig {
            port: "/dev/nonexistent_modem".to_string(),
            ..SerialConfig::default()
        };

        match RadioSerial::open(&config) {
            Err(GimbalLinkError::SerialPortNotFound(msg)) => {
                assert!(msg.starts_with("/dev/nonexistent_modem"));
            }
            // A real modem on a fallback path is fine too
            Ok(serial) => assert_ne!(serial.device_path(), "/dev/nonexistent_modem"),
            Err(other) => panic!("Expected SerialPortNotFound, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_frame_writes_all_bytes() {
        let frame = encode_command(&CommandFrame::no_change(9));
        let mock = Builder::new().write(&frame).build();
        let mut serial = RadioSerial::from_port(StreamPort::new(mock), "mock");

        serial.send_frame(&frame).await.unwrap();
    }

    #[tokio::test]
    async fn test_send_frame_write_error() {
        let frame = [0u8; 24];
        let mock = Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::TimedOut, "stalled"))
            .build();
        let mut serial = RadioSerial::from_port(StreamPort::new(mock), "mock");

        match serial.send_frame(&frame).await {
            Err(GimbalLinkError::Serial(msg)) => assert!(msg.contains("Failed to write frame")),
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_chunk() {
        let mock = Builder::new().read(&[0x37, 0x25]).build();
        let mut serial = RadioSerial::from_port(StreamPort::new(mock), "mock");

        let mut buf = [0u8; 64];
        assert_eq!(serial.read_chunk(&mut buf).await.unwrap(), 2);
        assert_eq!(&buf[..2], &[0x37, 0x25]);
    }

    #[tokio::test]
    async fn test_read_chunk_eof_is_error() {
        let mock = Builder::new().build();
        let mut serial = RadioSerial::from_port(StreamPort::new(mock), "mock");

        let mut buf = [0u8; 64];
        assert!(matches!(
            serial.read_chunk(&mut buf).await,
            Err(GimbalLinkError::Serial(_))
        ));
    }

    #[test]
    #[ignore] // Requires a radio modem: cargo test -- --ignored
    fn test_open_with_real_hardware() {
        match RadioSerial::open(&SerialConfig::default()) {
            Ok(serial) => println!("Opened radio modem at: {}", serial.device_path()),
            Err(e) => println!("No radio modem detected: {}", e),
        }
    }
}
