// Core module - Probe loop, readback and events
pub mod event;
pub mod prober;
pub mod readback;
pub mod reader;
pub mod session;

pub use event::{EventKind, ProbeEvent, ProbeStats};
pub use prober::Prober;
pub use readback::{ReadFilter, ReadbackMode};
pub use reader::MonitorReader;
pub use session::ProbeSession;
