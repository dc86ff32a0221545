// Domain module - Configuration, packets and errors
pub mod config;
pub mod error;
pub mod packet;
