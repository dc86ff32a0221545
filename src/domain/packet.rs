//! Probe packets.
//!
//! A probe packet is an opaque, named byte string. Nothing here frames or
//! validates the bytes; they are written to the port exactly as stored.

use crate::domain::error::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};

/// Short status probe. Kept in the default configuration but disabled.
pub const STATUS_PROBE: [u8; 6] = [0x7e, 0x04, 0x00, 0xff, 0xff, 0x7f];

/// Command probe sent every cycle by default.
pub const COMMAND_PROBE: [u8; 14] = [
    0x7e, 0x01, 0x08, 0x00, 0x77, 0x01, 0x13, 0x00, 0x76, 0x00, 0x00, 0x69, 0x9b, 0x7f,
];

/// Named outbound byte sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePacket {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ProbePacket {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> ProbeResult<Self> {
        let name = name.into();
        if bytes.is_empty() {
            return Err(ProbeError::InvalidData(format!("packet '{}' is empty", name)));
        }
        Ok(Self { name, bytes })
    }

    pub fn status() -> Self {
        Self {
            name: "status".to_string(),
            bytes: STATUS_PROBE.to_vec(),
        }
    }

    pub fn command() -> Self {
        Self {
            name: "command".to_string(),
            bytes: COMMAND_PROBE.to_vec(),
        }
    }

    /// Parse a packet from loosely formatted hex.
    ///
    /// Accepts `7e 01 08`, `7e0108`, `0x7e,0x01` and `7e:01:08`.
    pub fn from_hex(name: impl Into<String>, text: &str) -> ProbeResult<Self> {
        let bytes = decode_hex(text)?;
        Self::new(name, bytes)
    }

    /// Space separated lower-case hex
    pub fn to_hex(&self) -> String {
        format_hex(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Display for ProbePacket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.name, self.to_hex())
    }
}

/// Encoding of a payload given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Text,
    Hex,
    Base64,
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataFormat::Text => write!(f, "text"),
            DataFormat::Hex => write!(f, "hex"),
            DataFormat::Base64 => write!(f, "base64"),
        }
    }
}

/// Decode user supplied data in the given format
pub fn parse_data(data: &str, format: DataFormat) -> ProbeResult<Vec<u8>> {
    match format {
        DataFormat::Text => Ok(data.as_bytes().to_vec()),
        DataFormat::Hex => decode_hex(data),
        DataFormat::Base64 => {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| ProbeError::InvalidInput(format!("Invalid base64 data: {}", e)))
        }
    }
}

pub(crate) fn decode_hex(text: &str) -> ProbeResult<Vec<u8>> {
    let cleaned: String = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .map(|token| {
            // "0x7" style single-nibble tokens are padded so "0x7,0x10" works
            if token.len() == 1 {
                format!("0{}", token)
            } else {
                token.to_string()
            }
        })
        .collect();

    hex::decode(&cleaned).map_err(|e| ProbeError::InvalidData(format!("Invalid hex data: {}", e)))
}

pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
