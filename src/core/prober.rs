//! The probe write loop.

use crate::core::event::ProbeEvent;
use crate::core::readback::{ReadFilter, ReadbackMode};
use crate::domain::config::{ProbeConfig, ReadbackConfig, ScheduleConfig};
use crate::domain::error::{ProbeError, ProbeResult};
use crate::domain::packet::ProbePacket;
use std::io::{ErrorKind, Read, Write};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Writes probe packets byte by byte on a fixed cadence
pub struct Prober {
    schedule: ScheduleConfig,
    packets: Vec<ProbePacket>,
    readback: ReadbackConfig,
    run_id: String,
}

impl Prober {
    pub fn new(
        schedule: ScheduleConfig,
        packets: Vec<ProbePacket>,
        readback: ReadbackConfig,
        run_id: impl Into<String>,
    ) -> ProbeResult<Self> {
        if packets.is_empty() {
            return Err(ProbeError::config("no packets to send"));
        }

        Ok(Self {
            schedule,
            packets,
            readback,
            run_id: run_id.into(),
        })
    }

    pub fn from_config(config: &ProbeConfig, run_id: impl Into<String>) -> ProbeResult<Self> {
        Self::new(
            config.schedule.clone(),
            config.enabled_packets()?,
            config.readback.clone(),
            run_id,
        )
    }

    pub fn packets(&self) -> &[ProbePacket] {
        &self.packets
    }

    /// Run the loop until the configured cycle count is reached.
    ///
    /// Without a cycle count this never returns `Ok`; the caller stops it by
    /// dropping the future. Returns the number of completed cycles.
    pub async fn run<P>(
        &self,
        port: &mut P,
        events: &mpsc::UnboundedSender<ProbeEvent>,
    ) -> ProbeResult<u64>
    where
        P: Read + Write + ?Sized,
    {
        // Monitor mode reads on its own thread; only sentinel mode reads here
        let sentinel = match self.readback.mode {
            ReadbackMode::Sentinel => Some(ReadFilter::Sentinel(self.readback.sentinel)),
            ReadbackMode::Off | ReadbackMode::Monitor => None,
        };
        let mut buffer = vec![0u8; self.readback.buffer_size.max(1)];

        info!(
            run_id = %self.run_id,
            packets = self.packets.len(),
            mode = %self.readback.mode,
            "Probe run starting"
        );

        sleep(self.schedule.startup_delay()).await;

        let mut completed = 0u64;
        loop {
            if let Some(limit) = self.schedule.cycles {
                if completed >= limit {
                    break;
                }
            }
            let cycle = completed + 1;

            for packet in &self.packets {
                self.send_packet(port, packet).await?;
                emit(events, ProbeEvent::sent(&self.run_id, cycle, &packet.name, packet.bytes.clone()));

                if let Some(filter) = &sentinel {
                    if let Some(hits) = read_back(port, filter, &mut buffer)? {
                        emit(events, ProbeEvent::sentinel(&self.run_id, cycle, hits));
                    }
                }

                sleep(self.schedule.cycle_delay()).await;
            }

            completed = cycle;
            emit(events, ProbeEvent::cycle_complete(&self.run_id, completed));
            debug!("Completed cycle {}", completed);
        }

        info!(run_id = %self.run_id, cycles = completed, "Probe run finished");
        Ok(completed)
    }

    async fn send_packet<P>(&self, port: &mut P, packet: &ProbePacket) -> ProbeResult<()>
    where
        P: Write + ?Sized,
    {
        for byte in &packet.bytes {
            port.write_all(std::slice::from_ref(byte))?;
            port.flush()?;
            sleep(self.schedule.byte_delay()).await;
        }
        debug!("Sent packet {}", packet);
        Ok(())
    }
}

/// One read of whatever is waiting; a timeout or signal counts as nothing received
fn read_back<P>(port: &mut P, filter: &ReadFilter, buffer: &mut [u8]) -> ProbeResult<Option<Vec<u8>>>
where
    P: Read + ?Sized,
{
    match port.read(buffer) {
        Ok(n) => Ok(filter.apply(&buffer[..n])),
        Err(ref e)
            if matches!(
                e.kind(),
                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
            ) =>
        {
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn emit(events: &mpsc::UnboundedSender<ProbeEvent>, event: ProbeEvent) {
    if let Err(e) = events.send(event) {
        warn!("Failed to deliver probe event: {}", e);
    }
}
