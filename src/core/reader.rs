//! Background monitor reader.
//!
//! Reads whatever the port has on its own OS thread and forwards filtered
//! buffers as [`ProbeEvent`]s. It does not coordinate with the writer, so a
//! reply may be reported before, during or after the packet that caused it
//! has finished sending.

use crate::core::event::ProbeEvent;
use crate::core::readback::ReadFilter;
use crate::domain::error::ProbeResult;
use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct MonitorReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MonitorReader {
    /// Start the reader thread.
    ///
    /// `reader` must return within a bounded time (a serial port with a read
    /// timeout), otherwise [`MonitorReader::stop`] blocks until data arrives.
    pub fn spawn<R>(
        mut reader: R,
        filter: ReadFilter,
        buffer_size: usize,
        run_id: String,
        events: mpsc::UnboundedSender<ProbeEvent>,
    ) -> ProbeResult<Self>
    where
        R: Read + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("serprobe-reader".to_string())
            .spawn(move || {
                let mut buffer = vec![0u8; buffer_size.max(1)];

                while !stop_flag.load(Ordering::Relaxed) {
                    match reader.read(&mut buffer) {
                        Ok(0) => continue,
                        Ok(n) => {
                            debug!("Received {} bytes over serial", n);
                            let Some(data) = filter.apply(&buffer[..n]) else {
                                continue;
                            };
                            if events.send(ProbeEvent::received(&run_id, data)).is_err() {
                                warn!("Event receiver closed, stopping reader");
                                break;
                            }
                        }
                        Err(ref e)
                            if matches!(
                                e.kind(),
                                ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                            ) =>
                        {
                            continue;
                        }
                        Err(e) => {
                            error!("Failed to read from serial port: {}", e);
                            break;
                        }
                    }
                }

                debug!("Reader thread exiting");
            })?;

        info!("Background reader started");

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Signal the thread and wait for it to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Reader thread panicked");
            }
        }
    }
}

impl Drop for MonitorReader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
