//! # Emergency Stop
//!
//! Edge-triggered stop request shared between an asynchronous source (a
//! signal handler, a hardware interrupt task) and the control loop.
//!
//! The trigger side only stores into an atomic flag. The control loop polls
//! and clears the flag once per cycle and applies the safe state itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Control-loop side of the emergency stop.
#[derive(Debug, Default)]
pub struct EmergencyStop {
    flag: Arc<AtomicBool>,
}

/// Cloneable trigger handle.
///
/// Safe to use from signal handlers and other tasks: `trigger` does nothing
/// but a single atomic store.
#[derive(Debug, Clone)]
pub struct EmergencyStopTrigger {
    flag: Arc<AtomicBool>,
}

impl EmergencyStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for raising the stop from elsewhere
    pub fn trigger_handle(&self) -> EmergencyStopTrigger {
        EmergencyStopTrigger {
            flag: Arc::clone(&self.flag),
        }
    }

    /// Consume a pending stop.
    ///
    /// # Returns
    ///
    /// * `bool` - `true` exactly once per raised edge
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

impl EmergencyStopTrigger {
    /// Raise the stop
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Release);
    }
}
