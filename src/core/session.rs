//! One probe run: a port, an optional background reader and the write loop.

use crate::core::event::ProbeEvent;
use crate::core::prober::Prober;
use crate::core::reader::MonitorReader;
use crate::core::readback::{ReadFilter, ReadbackMode};
use crate::domain::config::ProbeConfig;
use crate::domain::error::{ProbeError, ProbeResult};
use crate::infrastructure::serial::open_port;
use std::io::{Read, Write};
use tokio::sync::mpsc;
use tracing::info;

pub struct ProbeSession {
    config: ProbeConfig,
    run_id: String,
}

impl ProbeSession {
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            run_id: uuid::Uuid::new_v4().simple().to_string(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Open the configured serial port and run until done.
    ///
    /// In monitor mode the port is cloned so the reader thread owns its own
    /// handle.
    pub async fn run_serial(&self, events: mpsc::UnboundedSender<ProbeEvent>) -> ProbeResult<u64> {
        let mut port = open_port(&self.config.port)?;

        let monitor = if self.config.readback.mode == ReadbackMode::Monitor {
            Some(port.try_clone()?)
        } else {
            None
        };

        self.run_with(&mut port, monitor, events).await
    }

    /// Run over arbitrary handles. `monitor` is required in monitor mode.
    pub async fn run_with<P, R>(
        &self,
        port: &mut P,
        monitor: Option<R>,
        events: mpsc::UnboundedSender<ProbeEvent>,
    ) -> ProbeResult<u64>
    where
        P: Read + Write + ?Sized,
        R: Read + Send + 'static,
    {
        let readback = &self.config.readback;

        // Held for the whole run; dropping it (also on cancellation) stops the thread
        let _reader = match (readback.mode, monitor) {
            (ReadbackMode::Monitor, Some(handle)) => Some(MonitorReader::spawn(
                handle,
                ReadFilter::All,
                readback.buffer_size,
                self.run_id.clone(),
                events.clone(),
            )?),
            (ReadbackMode::Monitor, None) => {
                return Err(ProbeError::config("monitor mode needs a reader handle"));
            }
            _ => None,
        };

        let prober = Prober::from_config(&self.config, self.run_id.clone())?;
        info!(
            "Probing {} at {} baud ({} packet(s), readback {})",
            self.config.port.path,
            self.config.port.baud_rate,
            prober.packets().len(),
            readback.mode
        );

        prober.run(port, &events).await
    }
}
