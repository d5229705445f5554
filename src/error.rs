//! # Error Types
//!
//! Custom error types for Gimbal Link using `thiserror`.

use thiserror::Error;

use crate::protocol::decoder::DecodeError;

/// Main error type for Gimbal Link
#[derive(Debug, Error)]
pub enum GimbalLinkError {
    /// Frame decode errors
    #[error("Frame decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No radio modem found at any of the tried paths
    #[error("No radio modem found (tried: {0})")]
    SerialPortNotFound(String),

    /// Telemetry journal errors
    #[error("Telemetry journal error: {0}")]
    Journal(String),
}

/// Result type alias for Gimbal Link
pub type Result<T> = std::result::Result<T, GimbalLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_converts() {
        let err: GimbalLinkError = DecodeError::Length { actual: 3 }.into();
        assert!(matches!(err, GimbalLinkError::Decode(DecodeError::Length { actual: 3 })));
        assert!(err.to_string().contains("frame length 3"));
    }

    #[test]
    fn test_io_error_converts() {
        let err: GimbalLinkError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, GimbalLinkError::Io(_)));
    }

    #[test]
    fn test_serial_port_not_found_message() {
        let err = GimbalLinkError::SerialPortNotFound("/dev/a, /dev/b".to_string());
        assert_eq!(err.to_string(), "No radio modem found (tried: /dev/a, /dev/b)");
    }
}
