use crate::domain::config::{FlowControlConfig, ParityConfig, PortConfig};
use crate::domain::error::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use serialport::{SerialPort, SerialPortBuilder, SerialPortType};
use std::time::Duration;
use tracing::info;

/// Serial port discovered on the system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortInfo {
    pub name: String,
    pub kind: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub product: Option<String>,
}

/// Build a `serialport` builder from the port configuration
pub fn port_builder(config: &PortConfig) -> ProbeResult<SerialPortBuilder> {
    let data_bits = match config.data_bits {
        5 => serialport::DataBits::Five,
        6 => serialport::DataBits::Six,
        7 => serialport::DataBits::Seven,
        8 => serialport::DataBits::Eight,
        other => return Err(ProbeError::config(format!("Invalid data bits: {}", other))),
    };

    let stop_bits = match config.stop_bits {
        1 => serialport::StopBits::One,
        2 => serialport::StopBits::Two,
        other => return Err(ProbeError::config(format!("Invalid stop bits: {}", other))),
    };

    let parity = match config.parity {
        ParityConfig::None => serialport::Parity::None,
        ParityConfig::Even => serialport::Parity::Even,
        ParityConfig::Odd => serialport::Parity::Odd,
    };

    let flow_control = match config.flow_control {
        FlowControlConfig::None => serialport::FlowControl::None,
        FlowControlConfig::Software => serialport::FlowControl::Software,
        FlowControlConfig::Hardware => serialport::FlowControl::Hardware,
    };

    Ok(serialport::new(config.path.as_str(), config.baud_rate)
        .data_bits(data_bits)
        .stop_bits(stop_bits)
        .parity(parity)
        .flow_control(flow_control)
        .timeout(Duration::from_millis(config.read_timeout_ms)))
}

/// Open the configured port
pub fn open_port(config: &PortConfig) -> ProbeResult<Box<dyn SerialPort>> {
    let port = port_builder(config)?
        .open()
        .map_err(|source| ProbeError::PortOpen {
            path: config.path.clone(),
            source,
        })?;

    info!("Opened {} at {} baud", config.path, config.baud_rate);
    Ok(port)
}

/// Enumerate serial ports
pub fn list_ports() -> ProbeResult<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|port| match port.port_type {
            SerialPortType::UsbPort(usb) => PortInfo {
                name: port.port_name,
                kind: "usb".to_string(),
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                product: usb.product,
            },
            SerialPortType::PciPort => PortInfo {
                name: port.port_name,
                kind: "pci".to_string(),
                vid: None,
                pid: None,
                product: None,
            },
            SerialPortType::BluetoothPort => PortInfo {
                name: port.port_name,
                kind: "bluetooth".to_string(),
                vid: None,
                pid: None,
                product: None,
            },
            SerialPortType::Unknown => PortInfo {
                name: port.port_name,
                kind: "unknown".to_string(),
                vid: None,
                pid: None,
                product: None,
            },
        })
        .collect())
}
