//! # Scan Module
//!
//! Autonomous sweep patterns for the gimbal.
//!
//! A full scan runs horizontal → vertical → diagonal 1 → diagonal 2 and
//! ends in `Idle`. Each phase steps the target by 10° per tick.
//!
//! ## Script Codes
//!
//! | Code | Action |
//! |------|--------|
//! | 1, 3 | Horizontal scan, laser on |
//! | 2 | Stop all (Idle, laser off, servo off) |
//! | 4 | Vertical scan, laser on |
//! | 5 | Diagonal 1 scan, laser on |
//! | 6 | Diagonal 2 scan, laser on |
//! | other | Ignored |

pub mod machine;

pub use machine::ScanStateMachine;

use serde::Serialize;

/// Scan state; the discriminant is the telemetry mode byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u8)]
pub enum ScanMode {
    Idle = 0,
    ScanHorizontal = 1,
    ScanVertical = 2,
    ScanDiagonal1 = 3,
    ScanDiagonal2 = 4,
    Manual = 5,
}

impl ScanMode {
    /// Telemetry mode byte
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Whether this state steps autonomously
    pub fn is_scanning(self) -> bool {
        self.start_pose().is_some()
    }

    /// Target (x, y) set on entry to a scanning state
    pub(crate) fn start_pose(self) -> Option<(i8, i8)> {
        match self {
            ScanMode::ScanHorizontal => Some((0, -40)),
            ScanMode::ScanVertical => Some((-40, 0)),
            ScanMode::ScanDiagonal1 => Some((-40, -40)),
            ScanMode::ScanDiagonal2 => Some((-40, 40)),
            ScanMode::Idle | ScanMode::Manual => None,
        }
    }
}

/// Uplink script code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptCode {
    ScanHorizontal,
    StopAll,
    ScanVertical,
    ScanDiagonal1,
    ScanDiagonal2,
}

impl ScriptCode {
    /// Look up a script code; unknown codes (including the 0xFF sentinel)
    /// return `None`.
    ///
    /// Codes 1 and 3 are aliases.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 | 3 => Some(ScriptCode::ScanHorizontal),
            2 => Some(ScriptCode::StopAll),
            4 => Some(ScriptCode::ScanVertical),
            5 => Some(ScriptCode::ScanDiagonal1),
            6 => Some(ScriptCode::ScanDiagonal2),
            _ => None,
        }
    }

    /// Scan state started by this code, `None` for stop-all
    pub fn scan_mode(self) -> Option<ScanMode> {
        match self {
            ScriptCode::ScanHorizontal => Some(ScanMode::ScanHorizontal),
            ScriptCode::ScanVertical => Some(ScanMode::ScanVertical),
            ScriptCode::ScanDiagonal1 => Some(ScanMode::ScanDiagonal1),
            ScriptCode::ScanDiagonal2 => Some(ScanMode::ScanDiagonal2),
            ScriptCode::StopAll => None,
        }
    }
}
