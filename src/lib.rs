//! SerProbe Library
//!
//! Serial probe tool library: writes fixed probe packets to a serial port
//! one byte at a time on a fixed cadence and reports what comes back, either
//! from a background reader or by checking for a sentinel byte after each
//! packet.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use core::event::{EventKind, ProbeEvent, ProbeStats};
pub use core::prober::Prober;
pub use core::session::ProbeSession;
pub use domain::config::{ProbeConfig, ReadbackMode};
pub use domain::error::{ProbeError, ProbeResult};
pub use domain::packet::ProbePacket;
