use crate::domain::error::{ProbeError, ProbeResult};
use crate::domain::packet::{format_hex, ProbePacket, COMMAND_PROBE, STATUS_PROBE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// SerProbe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Serial port settings
    #[serde(default)]
    pub port: PortConfig,
    /// Write cadence
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// What to do with received bytes
    #[serde(default)]
    pub readback: ReadbackConfig,
    /// Outbound probe packets, sent in order each cycle
    #[serde(default = "default_packets")]
    pub packets: Vec<PacketConfig>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    /// Device path
    #[serde(default = "default_port_path")]
    pub path: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: u8,
    #[serde(default)]
    pub parity: ParityConfig,
    #[serde(default)]
    pub flow_control: FlowControlConfig,
    /// Read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,
}

/// Parity configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParityConfig {
    None,
    Odd,
    Even,
}

/// Flow control configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControlConfig {
    None,
    Hardware,
    Software,
}

/// Timing of the write loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Pause after opening the port before the first write
    #[serde(default = "default_startup_delay")]
    pub startup_delay_ms: u64,
    /// Pause between consecutive bytes of a packet
    #[serde(default = "default_byte_delay")]
    pub byte_delay_ms: u64,
    /// Pause after each packet
    #[serde(default = "default_cycle_delay")]
    pub cycle_delay_ms: u64,
    /// Number of cycles; unset runs until interrupted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycles: Option<u64>,
}

/// Readback handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadbackConfig {
    #[serde(default)]
    pub mode: ReadbackMode,
    /// Byte compared against in sentinel mode
    #[serde(default = "default_sentinel")]
    pub sentinel: u8,
    /// Read buffer size in bytes
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

/// How received bytes are consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadbackMode {
    /// Write only
    Off,
    /// Background reader prints every non-empty buffer
    Monitor,
    /// Read back after each packet and report sentinel bytes
    Sentinel,
}

/// Probe packet definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketConfig {
    pub name: String,
    /// Packet bytes as hex
    pub hex: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_port_path() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_data_bits() -> u8 {
    8
}

fn default_stop_bits() -> u8 {
    1
}

fn default_read_timeout() -> u64 {
    100
}

fn default_startup_delay() -> u64 {
    2000
}

fn default_byte_delay() -> u64 {
    100
}

fn default_cycle_delay() -> u64 {
    2000
}

fn default_sentinel() -> u8 {
    0xFF
}

fn default_buffer_size() -> usize {
    1024
}

fn default_enabled() -> bool {
    true
}

fn default_packets() -> Vec<PacketConfig> {
    vec![
        PacketConfig {
            name: "status".to_string(),
            hex: format_hex(&STATUS_PROBE),
            enabled: false,
        },
        PacketConfig {
            name: "command".to_string(),
            hex: format_hex(&COMMAND_PROBE),
            enabled: true,
        },
    ]
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            port: PortConfig::default(),
            schedule: ScheduleConfig::default(),
            readback: ReadbackConfig::default(),
            packets: default_packets(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            path: default_port_path(),
            baud_rate: default_baud_rate(),
            data_bits: default_data_bits(),
            stop_bits: default_stop_bits(),
            parity: ParityConfig::default(),
            flow_control: FlowControlConfig::default(),
            read_timeout_ms: default_read_timeout(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay(),
            byte_delay_ms: default_byte_delay(),
            cycle_delay_ms: default_cycle_delay(),
            cycles: None,
        }
    }
}

impl Default for ReadbackConfig {
    fn default() -> Self {
        Self {
            mode: ReadbackMode::default(),
            sentinel: default_sentinel(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl Default for ParityConfig {
    fn default() -> Self {
        Self::None
    }
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self::None
    }
}

impl Default for ReadbackMode {
    fn default() -> Self {
        Self::Monitor
    }
}

impl std::fmt::Display for ReadbackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadbackMode::Off => write!(f, "off"),
            ReadbackMode::Monitor => write!(f, "monitor"),
            ReadbackMode::Sentinel => write!(f, "sentinel"),
        }
    }
}

impl ScheduleConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn byte_delay(&self) -> Duration {
        Duration::from_millis(self.byte_delay_ms)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }
}

impl PacketConfig {
    pub fn to_packet(&self) -> ProbeResult<ProbePacket> {
        ProbePacket::from_hex(self.name.clone(), &self.hex)
    }
}

impl From<&ProbePacket> for PacketConfig {
    fn from(packet: &ProbePacket) -> Self {
        Self {
            name: packet.name.clone(),
            hex: packet.to_hex(),
            enabled: true,
        }
    }
}

impl ProbeConfig {
    /// Check value ranges and packet definitions
    pub fn validate(&self) -> ProbeResult<()> {
        if self.port.path.trim().is_empty() {
            return Err(ProbeError::config("port path must not be empty"));
        }
        if self.port.baud_rate == 0 {
            return Err(ProbeError::config("baud rate must be greater than zero"));
        }
        if !(5..=8).contains(&self.port.data_bits) {
            return Err(ProbeError::config(format!(
                "invalid data bits: {}",
                self.port.data_bits
            )));
        }
        if !(1..=2).contains(&self.port.stop_bits) {
            return Err(ProbeError::config(format!(
                "invalid stop bits: {}",
                self.port.stop_bits
            )));
        }
        // A zero timeout turns every blocking read into an instant TimedOut
        if self.port.read_timeout_ms == 0 {
            return Err(ProbeError::config("read timeout must be greater than zero"));
        }
        if self.readback.buffer_size == 0 {
            return Err(ProbeError::config("readback buffer size must be greater than zero"));
        }

        let mut names = HashSet::new();
        for packet in &self.packets {
            if !names.insert(packet.name.as_str()) {
                return Err(ProbeError::config(format!(
                    "duplicate packet name '{}'",
                    packet.name
                )));
            }
            packet.to_packet().map_err(|e| {
                ProbeError::config(format!("packet '{}': {}", packet.name, e))
            })?;
        }

        if !self.packets.iter().any(|p| p.enabled) {
            return Err(ProbeError::config("no enabled packets"));
        }

        Ok(())
    }

    /// Enabled packets in declaration order
    pub fn enabled_packets(&self) -> ProbeResult<Vec<ProbePacket>> {
        self.packets
            .iter()
            .filter(|p| p.enabled)
            .map(PacketConfig::to_packet)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serialization() {
        let config = ProbeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: ProbeConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(deserialized.packets.len(), 2);
        assert_eq!(deserialized.port.baud_rate, 115200);
    }

    #[test]
    fn test_defaults_match_hardcoded_probe() {
        let config = ProbeConfig::default();

        assert_eq!(config.port.path, "/dev/ttyUSB0");
        assert_eq!(config.port.baud_rate, 115200);
        assert_eq!(config.schedule.startup_delay(), Duration::from_secs(2));
        assert_eq!(config.schedule.byte_delay(), Duration::from_millis(100));
        assert_eq!(config.schedule.cycle_delay(), Duration::from_secs(2));
        assert_eq!(config.schedule.cycles, None);
        assert_eq!(config.readback.sentinel, 0xFF);

        let packets = config.enabled_packets().unwrap();
        assert_eq!(packets, vec![ProbePacket::command()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ProbeConfig = toml::from_str(
            r#"
            [port]
            path = "/dev/ttyACM0"

            [schedule]
            cycles = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.port.path, "/dev/ttyACM0");
        assert_eq!(config.port.baud_rate, 115200);
        assert_eq!(config.schedule.cycles, Some(3));
        assert_eq!(config.schedule.byte_delay_ms, 100);
        assert_eq!(config.packets.len(), 2);
        assert_eq!(config.readback.mode, ReadbackMode::Monitor);
    }

    #[test]
    fn test_packets_from_toml() {
        let config: ProbeConfig = toml::from_str(
            r#"
            [readback]
            mode = "sentinel"

            [[packets]]
            name = "ping"
            hex = "7e 00 7f"
            "#,
        )
        .unwrap();

        assert_eq!(config.readback.mode, ReadbackMode::Sentinel);
        let packets = config.enabled_packets().unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].bytes, vec![0x7e, 0x00, 0x7f]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ProbeConfig::default();
        config.port.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = ProbeConfig::default();
        config.port.data_bits = 9;
        assert!(config.validate().is_err());

        let mut config = ProbeConfig::default();
        config.port.stop_bits = 3;
        assert!(config.validate().is_err());

        let mut config = ProbeConfig::default();
        config.readback.buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_read_timeout() {
        let mut config = ProbeConfig::default();
        config.port.read_timeout_ms = 0;
        match config.validate() {
            Err(ProbeError::Config { message }) => assert!(message.contains("read timeout")),
            other => panic!("zero read timeout accepted: {:?}", other),
        }

        config.port.read_timeout_ms = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_packets() {
        let mut config = ProbeConfig::default();
        for packet in &mut config.packets {
            packet.enabled = false;
        }
        assert!(config.validate().is_err());

        let mut config = ProbeConfig::default();
        config.packets[1].name = "status".to_string();
        assert!(config.validate().is_err());

        let mut config = ProbeConfig::default();
        config.packets[0].hex = "zz".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("status"));
    }
}
