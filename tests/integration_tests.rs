use serprobe::{EventKind, ProbeConfig, ProbePacket, ProbeSession, ProbeStats, Prober, ReadbackMode};
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Port double that records writes with the time they happened
#[derive(Default)]
struct TimedPort {
    writes: Vec<(Instant, u8)>,
    replies: VecDeque<Vec<u8>>,
}

impl Read for TimedPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self.replies.pop_front() {
            Some(reply) => {
                buf[..reply.len()].copy_from_slice(&reply);
                Ok(reply.len())
            }
            None => Err(std::io::Error::new(ErrorKind::TimedOut, "timed out")),
        }
    }
}

impl Write for TimedPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let now = Instant::now();
        self.writes.extend(buf.iter().map(|b| (now, *b)));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Integration tests for SerProbe library
#[cfg(test)]
mod integration_tests {
    use super::*;

    fn quick_config(mode: ReadbackMode, cycles: u64) -> ProbeConfig {
        let mut config = ProbeConfig::default();
        config.schedule.startup_delay_ms = 0;
        config.schedule.byte_delay_ms = 2;
        config.schedule.cycle_delay_ms = 10;
        config.schedule.cycles = Some(cycles);
        config.readback.mode = mode;
        config
    }

    #[tokio::test]
    async fn test_bytes_are_spaced_by_byte_delay() {
        let config = quick_config(ReadbackMode::Off, 1);
        let prober = Prober::from_config(&config, "spacing").unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut port = TimedPort::default();

        prober.run(&mut port, &tx).await.unwrap();

        let bytes: Vec<u8> = port.writes.iter().map(|(_, b)| *b).collect();
        assert_eq!(bytes, ProbePacket::command().bytes);

        for pair in port.writes.windows(2) {
            assert!(pair[1].0.duration_since(pair[0].0) >= Duration::from_millis(2));
        }
    }

    #[tokio::test]
    async fn test_sentinel_session_counts_hits() {
        let session = ProbeSession::new(quick_config(ReadbackMode::Sentinel, 3)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut port = TimedPort::default();
        port.replies.push_back(vec![0xff]);
        port.replies.push_back(vec![0x00, 0x01]);
        port.replies.push_back(vec![0xff, 0x10, 0xff]);

        let cycles = session.run_with(&mut port, None::<TimedPort>, tx).await.unwrap();
        assert_eq!(cycles, 3);

        let mut stats = ProbeStats::default();
        let mut sentinel_cycles = Vec::new();
        while let Some(event) = rx.recv().await {
            if event.kind == EventKind::Sentinel {
                sentinel_cycles.push(event.cycle);
            }
            stats.record(&event);
        }

        assert_eq!(sentinel_cycles, vec![1, 3]);
        assert_eq!(stats.sentinel_hits, 3);
        assert_eq!(stats.packets_sent, 3);
        assert_eq!(stats.cycles, 3);
    }

    #[test]
    fn test_config_round_trip_through_toml() {
        let config = ProbeConfig::default();
        let toml_str = toml::to_string(&config).expect("Failed to serialize config");
        let deserialized: ProbeConfig = toml::from_str(&toml_str).expect("Failed to deserialize config");

        assert_eq!(deserialized.port.path, config.port.path);
        assert_eq!(
            deserialized.enabled_packets().unwrap(),
            config.enabled_packets().unwrap()
        );
    }

    #[test]
    fn test_runtime_driven_cancellation() {
        let mut config = quick_config(ReadbackMode::Off, 1);
        config.schedule.cycles = None;
        let prober = Prober::from_config(&config, "forever").unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut port = TimedPort::default();

        let result = tokio_test::block_on(async {
            tokio::time::timeout(Duration::from_millis(100), prober.run(&mut port, &tx)).await
        });

        assert!(result.is_err(), "unbounded run should only end by cancellation");
        assert!(port.writes.len() >= ProbePacket::command().len());
    }
}
