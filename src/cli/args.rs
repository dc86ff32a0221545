use crate::domain::config::{PacketConfig, ProbeConfig, ReadbackMode};
use crate::domain::error::{ProbeError, ProbeResult};
use crate::domain::packet::{parse_data, DataFormat, ProbePacket};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for SerProbe
#[derive(Parser, Debug)]
#[command(
    name = "serprobe",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serial probe tool for embedded devices",
    long_about = "Sends fixed probe packets to a serial device one byte at a time on a fixed cadence and prints whatever the device sends back."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the port and run the probe loop
    Run(RunArgs),
    /// List available serial ports
    Ports,
    /// List configured probe packets
    Packets,
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
    /// CSV output
    Csv,
}

/// Probe run arguments; each one overrides the configuration file
#[derive(ClapArgs, Debug, Default)]
pub struct RunArgs {
    /// Serial port path
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Delay before the first write, in milliseconds
    #[arg(long)]
    pub startup_delay_ms: Option<u64>,

    /// Delay after each byte, in milliseconds
    #[arg(long)]
    pub byte_delay_ms: Option<u64>,

    /// Delay after each packet, in milliseconds
    #[arg(long)]
    pub cycle_delay_ms: Option<u64>,

    /// Stop after this many cycles
    #[arg(short = 'n', long)]
    pub cycles: Option<u64>,

    /// Readback mode
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Sentinel byte for sentinel mode, in hex (e.g. ff)
    #[arg(long, value_parser = parse_sentinel)]
    pub sentinel: Option<u8>,

    /// Packet to send instead of the configured ones (repeatable)
    #[arg(long = "packet")]
    pub packets: Vec<String>,

    /// Encoding of --packet values
    #[arg(short, long, value_enum, default_value = "hex")]
    pub format: DataFormatArg,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate {
        /// Configuration file path
        file: Option<String>,
    },
    /// Create default configuration
    Init {
        /// Directory to create .serprobe/config.toml in
        #[arg(long)]
        dir: Option<String>,
        /// Write the global configuration instead
        #[arg(short, long)]
        global: bool,
    },
}

/// Readback mode argument
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ModeArg {
    Off,
    Monitor,
    Sentinel,
}

/// Data format argument
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum DataFormatArg {
    Text,
    #[default]
    Hex,
    Base64,
}

impl From<ModeArg> for ReadbackMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Off => Self::Off,
            ModeArg::Monitor => Self::Monitor,
            ModeArg::Sentinel => Self::Sentinel,
        }
    }
}

impl From<DataFormatArg> for DataFormat {
    fn from(format: DataFormatArg) -> Self {
        match format {
            DataFormatArg::Text => Self::Text,
            DataFormatArg::Hex => Self::Hex,
            DataFormatArg::Base64 => Self::Base64,
        }
    }
}

fn parse_sentinel(value: &str) -> Result<u8, String> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid sentinel byte '{}': {}", value, e))
}

impl RunArgs {
    /// Apply command line overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut ProbeConfig) -> ProbeResult<()> {
        if let Some(port) = &self.port {
            config.port.path = port.clone();
        }
        if let Some(baud) = self.baud {
            config.port.baud_rate = baud;
        }
        if let Some(ms) = self.startup_delay_ms {
            config.schedule.startup_delay_ms = ms;
        }
        if let Some(ms) = self.byte_delay_ms {
            config.schedule.byte_delay_ms = ms;
        }
        if let Some(ms) = self.cycle_delay_ms {
            config.schedule.cycle_delay_ms = ms;
        }
        if self.cycles.is_some() {
            config.schedule.cycles = self.cycles;
        }
        if let Some(mode) = self.mode {
            config.readback.mode = mode.into();
        }
        if let Some(sentinel) = self.sentinel {
            config.readback.sentinel = sentinel;
        }

        if !self.packets.is_empty() {
            let format = DataFormat::from(self.format);
            config.packets = self
                .packets
                .iter()
                .enumerate()
                .map(|(i, data)| {
                    let bytes = parse_data(data, format)?;
                    let packet = ProbePacket::new(format!("arg{}", i + 1), bytes)?;
                    Ok(PacketConfig::from(&packet))
                })
                .collect::<Result<Vec<_>, ProbeError>>()?;
        }

        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
