use crate::domain::packet::format_hex;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Something that crossed the wire during a probe run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeEvent {
    pub timestamp: SystemTime,
    pub run_id: String,
    pub kind: EventKind,
    /// 1-based write cycle the event belongs to; 0 for monitor reads
    pub cycle: u64,
    /// Packet name for sent events
    pub packet: Option<String>,
    pub data: Vec<u8>,
}

/// Event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Packet written to the port
    Sent,
    /// Buffer picked up by the background reader
    Received,
    /// Sentinel bytes found on readback
    Sentinel,
    /// Every enabled packet of a cycle went out, cycle delays included
    CycleComplete,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Sent => write!(f, "sent"),
            EventKind::Received => write!(f, "received"),
            EventKind::Sentinel => write!(f, "sentinel"),
            EventKind::CycleComplete => write!(f, "cycle_complete"),
        }
    }
}

impl ProbeEvent {
    pub fn sent(run_id: &str, cycle: u64, packet: &str, data: Vec<u8>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            run_id: run_id.to_string(),
            kind: EventKind::Sent,
            cycle,
            packet: Some(packet.to_string()),
            data,
        }
    }

    pub fn received(run_id: &str, data: Vec<u8>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            run_id: run_id.to_string(),
            kind: EventKind::Received,
            cycle: 0,
            packet: None,
            data,
        }
    }

    pub fn sentinel(run_id: &str, cycle: u64, data: Vec<u8>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            run_id: run_id.to_string(),
            kind: EventKind::Sentinel,
            cycle,
            packet: None,
            data,
        }
    }

    pub fn cycle_complete(run_id: &str, cycle: u64) -> Self {
        Self {
            timestamp: SystemTime::now(),
            run_id: run_id.to_string(),
            kind: EventKind::CycleComplete,
            cycle,
            packet: None,
            data: Vec::new(),
        }
    }

    pub fn hex(&self) -> String {
        format_hex(&self.data)
    }

    /// Printable rendering, non-ASCII bytes escaped
    pub fn ascii(&self) -> String {
        self.data
            .iter()
            .flat_map(|b| std::ascii::escape_default(*b))
            .map(char::from)
            .collect()
    }
}

/// Running totals for a probe run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStats {
    pub cycles: u64,
    pub packets_sent: u64,
    pub bytes_sent: u64,
    pub chunks_received: u64,
    pub bytes_received: u64,
    pub sentinel_hits: u64,
}

impl ProbeStats {
    pub fn record(&mut self, event: &ProbeEvent) {
        let len = event.data.len() as u64;
        match event.kind {
            EventKind::Sent => {
                self.packets_sent += 1;
                self.bytes_sent += len;
            }
            EventKind::Received => {
                self.chunks_received += 1;
                self.bytes_received += len;
            }
            EventKind::Sentinel => {
                self.sentinel_hits += len;
                self.bytes_received += len;
            }
            EventKind::CycleComplete => self.cycles = self.cycles.max(event.cycle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_rendering() {
        let event = ProbeEvent::received("run", vec![b'o', b'k', 0xff, b'\n']);
        assert_eq!(event.hex(), "6f 6b ff 0a");
        assert_eq!(event.ascii(), "ok\\xff\\n");
        assert_eq!(event.kind.to_string(), "received");
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ProbeStats::default();
        stats.record(&ProbeEvent::sent("run", 1, "command", vec![0; 14]));
        stats.record(&ProbeEvent::cycle_complete("run", 1));
        stats.record(&ProbeEvent::sent("run", 2, "command", vec![0; 14]));
        stats.record(&ProbeEvent::received("run", vec![1, 2, 3]));
        stats.record(&ProbeEvent::sentinel("run", 2, vec![0xff, 0xff]));

        // Cycle 2 was started but never completed
        assert_eq!(
            stats,
            ProbeStats {
                cycles: 1,
                packets_sent: 2,
                bytes_sent: 28,
                chunks_received: 1,
                bytes_received: 5,
                sentinel_hits: 2,
            }
        );
    }

    #[test]
    fn test_event_json() {
        let event = ProbeEvent::sent("run", 1, "status", vec![0x7e]);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "sent");
        assert_eq!(json["packet"], "status");
        assert_eq!(json["cycle"], 1);

        let marker = serde_json::to_value(ProbeEvent::cycle_complete("run", 3)).unwrap();
        assert_eq!(marker["kind"], "cycle_complete");
        assert_eq!(marker["cycle"], 3);
    }
}
