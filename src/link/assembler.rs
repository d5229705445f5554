//! # Frame Assembler
//!
//! Cuts the raw serial byte stream into 24-byte command frames.
//!
//! The radio modem delivers bytes in arbitrary chunks. Bytes ahead of a
//! command header are discarded, complete frames are yielded as they fill,
//! and a partial frame left behind by a dropped byte is flushed once the
//! line has been quiet for the serial timeout, so the decoder rejects it
//! with a length error instead of it corrupting the next frame.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::protocol::frame::{COMMAND_HEADER, FRAME_LEN};

/// Serial stream reassembler
#[derive(Debug)]
pub struct FrameAssembler {
    buffer: BytesMut,
    last_rx_ms: u32,
    discarded: u64,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(FRAME_LEN * 4),
            last_rx_ms: 0,
            discarded: 0,
        }
    }

    /// Append received bytes.
    ///
    /// # Arguments
    ///
    /// * `data` - Bytes read from the serial port
    /// * `now_ms` - Clock reading at receipt, used for stale flushing
    pub fn push(&mut self, data: &[u8], now_ms: u32) {
        if data.is_empty() {
            return;
        }
        self.buffer.extend_from_slice(data);
        self.last_rx_ms = now_ms;
    }

    /// Next complete frame, if buffered.
    ///
    /// Leading bytes that are not a command header are dropped first.
    pub fn next_frame(&mut self) -> Option<Bytes> {
        self.resync();

        if self.buffer.len() < FRAME_LEN {
            return None;
        }

        Some(self.buffer.split_to(FRAME_LEN).freeze())
    }

    /// Flush a partial frame after the line has gone quiet.
    ///
    /// # Returns
    ///
    /// * `Option<Bytes>` - The short fragment, if one was pending for at
    ///   least `timeout_ms`
    pub fn flush_stale(&mut self, now_ms: u32, timeout_ms: u32) -> Option<Bytes> {
        self.resync();

        if self.buffer.is_empty() || now_ms.wrapping_sub(self.last_rx_ms) < timeout_ms {
            return None;
        }

        debug!("Flushing stale partial frame ({} bytes)", self.buffer.len());
        Some(self.buffer.split().freeze())
    }

    /// Bytes currently held
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Total bytes dropped while hunting for a header
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    fn resync(&mut self) {
        let skip = self
            .buffer
            .iter()
            .position(|&b| b == COMMAND_HEADER)
            .unwrap_or(self.buffer.len());

        if skip > 0 {
            let _ = self.buffer.split_to(skip);
            self.discarded += skip as u64;
            debug!("Discarded {} bytes before frame header", skip);
        }
    }
}
