// Serial module - Port access
pub mod port;

pub use port::{list_ports, open_port, PortInfo};
