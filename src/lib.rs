//! # Gimbal Link Library
//!
//! Command/telemetry link and scan control for a two-axis laser gimbal
//! driven over a packet radio.
//!
//! This library provides the node core (frame codec, actuator model, scan
//! state machine, telemetry, emergency stop) and the host-side glue that
//! connects it to a radio modem on a serial port.

pub mod actuator;
pub mod config;
pub mod error;
pub mod link;
pub mod node;
pub mod protocol;
pub mod safety;
pub mod scan;
pub mod telemetry;
