//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Read available bytes into `buf`, returning the count (0 at EOF)
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Adapter implementing [`SerialPortIO`] for any tokio byte stream
#[derive(Debug)]
pub struct StreamPort<T> {
    stream: T,
}

impl<T> StreamPort<T> {
    pub fn new(stream: T) -> Self {
        Self { stream }
    }
}

/// Native serial port wrapper
pub type TokioSerialPort = StreamPort<tokio_serial::SerialStream>;

#[async_trait]
impl<T> SerialPortIO for StreamPort<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_stream_port_reads() {
        let mock = Builder::new().read(&[0x37, 0x25, 0x01]).build();
        let mut port = StreamPort::new(mock);

        let mut buf = [0u8; 8];
        let n = port.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], &[0x37, 0x25, 0x01]);
    }

    #[tokio::test]
    async fn test_stream_port_writes() {
        let mock = Builder::new().write(&[0x38, 0x25]).build();
        let mut port = StreamPort::new(mock);

        port.write_all(&[0x38, 0x25]).await.unwrap();
        port.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_stream_port_read_error() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
            .build();
        let mut port = StreamPort::new(mock);

        let mut buf = [0u8; 8];
        let err = port.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
