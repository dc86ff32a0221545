use crate::cli::args::OutputFormat;
use crate::core::event::{EventKind, ProbeEvent, ProbeStats};
use crate::domain::config::{PacketConfig, ProbeConfig};
use crate::infrastructure::serial::PortInfo;
use std::io;
use std::time::UNIX_EPOCH;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_event(&self, event: &ProbeEvent) -> Result<(), OutputError>;
    fn write_stats(&self, stats: &ProbeStats) -> Result<(), OutputError>;
    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError>;
    fn write_packets(&self, packets: &[PacketConfig]) -> Result<(), OutputError>;
    fn write_config(&self, config: &ProbeConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

impl From<OutputError> for crate::domain::error::ProbeError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
#[derive(Debug, Clone)]
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_event(&self, event: &ProbeEvent) -> Result<(), OutputError> {
        // Events stream one at a time, so table output falls back to text lines
        match self.format {
            OutputFormat::Text | OutputFormat::Table => println!("{}", event_line(event)),
            OutputFormat::Json => println!("{}", serde_json::to_string(&EventRecord::from(event))?),
            OutputFormat::Csv => println!("{}", event_csv(event)),
        }
        Ok(())
    }

    fn write_stats(&self, stats: &ProbeStats) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("Probe summary:");
                println!("  Cycles: {}", stats.cycles);
                println!("  Packets sent: {}", stats.packets_sent);
                println!("  Bytes sent: {}", stats.bytes_sent);
                println!("  Buffers received: {}", stats.chunks_received);
                println!("  Bytes received: {}", stats.bytes_received);
                println!("  Sentinel hits: {}", stats.sentinel_hits);
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(stats)?),
            OutputFormat::Table => println!("{}", Table::new(vec![StatsTableRow::from(stats)])),
            OutputFormat::Csv => {
                println!("cycles,packets_sent,bytes_sent,chunks_received,bytes_received,sentinel_hits");
                println!(
                    "{},{},{},{},{},{}",
                    stats.cycles,
                    stats.packets_sent,
                    stats.bytes_sent,
                    stats.chunks_received,
                    stats.bytes_received,
                    stats.sentinel_hits
                );
            }
        }
        Ok(())
    }

    fn write_ports(&self, ports: &[PortInfo]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                if ports.is_empty() {
                    println!("No serial ports found");
                }
                for port in ports {
                    match (port.vid, port.pid) {
                        (Some(vid), Some(pid)) => println!(
                            "{} ({} {:04x}:{:04x}{})",
                            port.name,
                            port.kind,
                            vid,
                            pid,
                            port.product.as_deref().map(|p| format!(" {}", p)).unwrap_or_default()
                        ),
                        _ => println!("{} ({})", port.name, port.kind),
                    }
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(ports)?),
            OutputFormat::Table => {
                if !ports.is_empty() {
                    let rows: Vec<PortTableRow> = ports.iter().map(PortTableRow::from).collect();
                    println!("{}", Table::new(rows));
                }
            }
            OutputFormat::Csv => {
                println!("name,kind,vid,pid,product");
                for port in ports {
                    println!(
                        "{},{},{},{},{}",
                        port.name,
                        port.kind,
                        port.vid.map(|v| format!("{:04x}", v)).unwrap_or_default(),
                        port.pid.map(|v| format!("{:04x}", v)).unwrap_or_default(),
                        port.product.clone().unwrap_or_default()
                    );
                }
            }
        }
        Ok(())
    }

    fn write_packets(&self, packets: &[PacketConfig]) -> Result<(), OutputError> {
        let rows: Vec<PacketTableRow> = packets.iter().map(PacketTableRow::from).collect();
        match self.format {
            OutputFormat::Text => {
                for row in &rows {
                    let state = if row.enabled { "enabled" } else { "disabled" };
                    println!("{} ({}, {} bytes): {}", row.name, state, row.length, row.bytes);
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(packets)?),
            OutputFormat::Table => {
                if !rows.is_empty() {
                    println!("{}", Table::new(rows));
                }
            }
            OutputFormat::Csv => {
                println!("name,enabled,length,bytes");
                for row in &rows {
                    println!("{},{},{},{}", row.name, row.enabled, row.length, row.bytes);
                }
            }
        }
        Ok(())
    }

    fn write_config(&self, config: &ProbeConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            _ => print!("{}", toml::to_string_pretty(config)?),
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

fn unix_millis(event: &ProbeEvent) -> u128 {
    event
        .timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// Single text line for an event
pub fn event_line(event: &ProbeEvent) -> String {
    if event.kind == EventKind::CycleComplete {
        return format!("[{}] cycle {} complete", unix_millis(event), event.cycle);
    }
    let label = match &event.packet {
        Some(name) => format!("{} {}", event.kind, name),
        None => event.kind.to_string(),
    };
    format!("[{}] {:<14} {} | {}", unix_millis(event), label, event.hex(), event.ascii())
}

fn event_csv(event: &ProbeEvent) -> String {
    format!(
        "{},{},{},{},{}",
        unix_millis(event),
        event.kind,
        event.cycle,
        event.packet.as_deref().unwrap_or(""),
        hex::encode(&event.data)
    )
}

/// Flat JSON shape for an event
#[derive(serde::Serialize)]
struct EventRecord<'a> {
    timestamp_ms: u128,
    run_id: &'a str,
    kind: String,
    cycle: u64,
    packet: Option<&'a str>,
    hex: String,
    length: usize,
}

impl<'a> From<&'a ProbeEvent> for EventRecord<'a> {
    fn from(event: &'a ProbeEvent) -> Self {
        Self {
            timestamp_ms: unix_millis(event),
            run_id: &event.run_id,
            kind: event.kind.to_string(),
            cycle: event.cycle,
            packet: event.packet.as_deref(),
            hex: hex::encode(&event.data),
            length: event.data.len(),
        }
    }
}

/// Table row for run statistics
#[derive(Tabled)]
struct StatsTableRow {
    cycles: u64,
    packets: u64,
    sent: u64,
    buffers: u64,
    received: u64,
    sentinel: u64,
}

impl From<&ProbeStats> for StatsTableRow {
    fn from(stats: &ProbeStats) -> Self {
        Self {
            cycles: stats.cycles,
            packets: stats.packets_sent,
            sent: stats.bytes_sent,
            buffers: stats.chunks_received,
            received: stats.bytes_received,
            sentinel: stats.sentinel_hits,
        }
    }
}

/// Table row for a serial port
#[derive(Tabled)]
struct PortTableRow {
    name: String,
    kind: String,
    usb_id: String,
    product: String,
}

impl From<&PortInfo> for PortTableRow {
    fn from(port: &PortInfo) -> Self {
        Self {
            name: port.name.clone(),
            kind: port.kind.clone(),
            usb_id: match (port.vid, port.pid) {
                (Some(vid), Some(pid)) => format!("{:04x}:{:04x}", vid, pid),
                _ => String::new(),
            },
            product: port.product.clone().unwrap_or_default(),
        }
    }
}

/// Table row for a packet definition
#[derive(Tabled)]
struct PacketTableRow {
    name: String,
    enabled: bool,
    length: usize,
    bytes: String,
}

impl From<&PacketConfig> for PacketTableRow {
    fn from(packet: &PacketConfig) -> Self {
        match packet.to_packet() {
            Ok(parsed) => Self {
                name: packet.name.clone(),
                enabled: packet.enabled,
                length: parsed.len(),
                bytes: parsed.to_hex(),
            },
            Err(_) => Self {
                name: packet.name.clone(),
                enabled: packet.enabled,
                length: 0,
                bytes: format!("invalid: {}", packet.hex),
            },
        }
    }
}
