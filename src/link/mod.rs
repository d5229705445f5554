//! # Link Module
//!
//! Boundary between the synchronous node core and the radio link.
//!
//! This module handles:
//! - The frame transport and clock interfaces the core depends on
//! - In-memory frame queues bridging the core and the async serial task
//! - Reassembling 24-byte frames from the serial byte stream
//! - Opening and driving the radio modem serial port

pub mod assembler;
pub mod port_trait;
pub mod serial;

pub use assembler::FrameAssembler;
pub use serial::RadioSerial;

use bytes::Bytes;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::warn;

use crate::protocol::frame::Frame;

/// Default outbound queue depth
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 16;

/// Non-blocking frame transport used by the node core
#[cfg_attr(test, mockall::automock)]
pub trait FrameTransport {
    /// Next inbound frame, if one is waiting
    fn receive_frame(&mut self) -> Option<Bytes>;

    /// Queue a frame for transmission.
    ///
    /// Returns `false` if the frame could not be accepted. The core does
    /// not retry.
    fn send_frame(&mut self, frame: &Frame) -> bool;
}

/// Millisecond tick source
pub trait Clock {
    /// Milliseconds since an arbitrary origin; wraps at `u32::MAX`
    fn now_millis(&self) -> u32;
}

/// Clock backed by [`Instant`], wrapping like a 32-bit tick counter
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u32 {
        // Truncation is the wrap
        self.origin.elapsed().as_millis() as u32
    }
}

/// In-memory frame queues.
///
/// The serial task pushes reassembled frames into the inbound queue and
/// drains the outbound queue; the node core sees it as a [`FrameTransport`].
#[derive(Debug)]
pub struct QueuedTransport {
    inbound: VecDeque<Bytes>,
    outbound: VecDeque<Frame>,
    outbound_capacity: usize,
}

impl QueuedTransport {
    /// Create queues with a bounded outbound side.
    ///
    /// # Arguments
    ///
    /// * `outbound_capacity` - Frames held before `send_frame` starts failing
    pub fn new(outbound_capacity: usize) -> Self {
        Self {
            inbound: VecDeque::new(),
            outbound: VecDeque::with_capacity(outbound_capacity),
            outbound_capacity,
        }
    }

    /// Hand a received frame to the core
    pub fn push_inbound(&mut self, frame: Bytes) {
        self.inbound.push_back(frame);
    }

    /// Take the oldest frame waiting for transmission
    pub fn pop_outbound(&mut self) -> Option<Frame> {
        self.outbound.pop_front()
    }

    pub fn inbound_len(&self) -> usize {
        self.inbound.len()
    }

    pub fn outbound_len(&self) -> usize {
        self.outbound.len()
    }
}

impl Default for QueuedTransport {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_CAPACITY)
    }
}

impl FrameTransport for QueuedTransport {
    fn receive_frame(&mut self) -> Option<Bytes> {
        self.inbound.pop_front()
    }

    fn send_frame(&mut self, frame: &Frame) -> bool {
        if self.outbound.len() >= self.outbound_capacity {
            warn!("Outbound queue full ({} frames), dropping frame", self.outbound_capacity);
            return false;
        }
        self.outbound.push_back(*frame);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::FRAME_LEN;

    #[test]
    fn test_inbound_fifo() {
        let mut transport = QueuedTransport::default();
        transport.push_inbound(Bytes::from_static(&[1, 2, 3]));
        transport.push_inbound(Bytes::from_static(&[4]));

        assert_eq!(transport.inbound_len(), 2);
        assert_eq!(transport.receive_frame().as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(transport.receive_frame().as_deref(), Some(&[4u8][..]));
        assert!(transport.receive_frame().is_none());
    }

    #[test]
    fn test_outbound_fifo() {
        let mut transport = QueuedTransport::default();
        let a = [0xAA; FRAME_LEN];
        let b = [0xBB; FRAME_LEN];

        assert!(transport.send_frame(&a));
        assert!(transport.send_frame(&b));
        assert_eq!(transport.pop_outbound(), Some(a));
        assert_eq!(transport.pop_outbound(), Some(b));
        assert_eq!(transport.pop_outbound(), None);
    }

    #[test]
    fn test_outbound_queue_is_bounded() {
        let mut transport = QueuedTransport::new(2);
        let frame = [0u8; FRAME_LEN];

        assert!(transport.send_frame(&frame));
        assert!(transport.send_frame(&frame));
        assert!(!transport.send_frame(&frame));
        assert_eq!(transport.outbound_len(), 2);

        transport.pop_outbound();
        assert!(transport.send_frame(&frame));
    }

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now_millis();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.now_millis().wrapping_sub(first) >= 5);
    }
}
