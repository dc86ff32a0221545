use crate::cli::args::{Args, Command, ConfigArgs, ConfigCommand, RunArgs};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::event::{ProbeEvent, ProbeStats};
use crate::core::session::ProbeSession;
use crate::domain::config::ProbeConfig;
use crate::domain::error::{ProbeError, ProbeResult};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::list_ports;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Execute CLI command
pub async fn execute_command(args: Args) -> ProbeResult<()> {
    let writer = ConsoleWriter::new(args.output);

    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose)?;
    }

    match args.command {
        Command::Run(run_args) => execute_run(run_args, &writer, config).await,
        Command::Ports => {
            let ports = list_ports()?;
            writer.write_ports(&ports)?;
            Ok(())
        }
        Command::Packets => {
            writer.write_packets(&config.packets)?;
            Ok(())
        }
        Command::Config(config_args) => {
            execute_config_command(config_args, &writer, &config, &config_manager)
        }
        Command::Version => {
            writer.write_message(&format!("serprobe {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

async fn execute_run(
    args: RunArgs,
    writer: &ConsoleWriter,
    mut config: ProbeConfig,
) -> ProbeResult<()> {
    args.apply_to(&mut config)?;
    let session = ProbeSession::new(config)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(rx, writer.clone()));

    let outcome = tokio::select! {
        result = session.run_serial(tx) => result.map(Some),
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Interrupted, stopping probe run");
            Ok(None)
        }
    };

    // The run future (and every event sender) is gone by now, so the printer drains and exits
    let stats = printer.await.map_err(|e| ProbeError::Output(format!("event printer failed: {}", e)))?;

    match outcome {
        Ok(cycles) => {
            if let Some(cycles) = cycles {
                info!("Completed {} cycle(s)", cycles);
            }
            writer.write_stats(&stats)?;
            Ok(())
        }
        Err(e) => {
            error!("Probe run {} failed: {}", session.run_id(), e);
            writer.write_stats(&stats)?;
            Err(e)
        }
    }
}

/// Print every event as it arrives and tally the run
async fn print_events(
    mut events: mpsc::UnboundedReceiver<ProbeEvent>,
    writer: ConsoleWriter,
) -> ProbeStats {
    let mut stats = ProbeStats::default();

    while let Some(event) = events.recv().await {
        stats.record(&event);
        if let Err(e) = writer.write_event(&event) {
            error!("Failed to print event: {}", e);
        }
    }

    stats
}

fn execute_config_command(
    args: ConfigArgs,
    writer: &ConsoleWriter,
    config: &ProbeConfig,
    config_manager: &ConfigManager,
) -> ProbeResult<()> {
    match args.command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
            Ok(())
        }
        ConfigCommand::Validate { file } => {
            let (label, loaded) = match file {
                Some(path) => {
                    let loaded = config_manager.load_config_from_path(path.as_ref());
                    (format!("Configuration file '{}'", path), loaded)
                }
                None => ("Current configuration".to_string(), Ok(config.clone())),
            };

            loaded.and_then(|c| c.validate())?;
            writer.write_message(&format!("{} is valid", label))?;
            Ok(())
        }
        ConfigCommand::Init { dir, global } => {
            if global {
                let global_path = config_manager.get_global_config_path();
                if global_path.exists() {
                    return Err(ProbeError::config(format!(
                        "Global configuration already exists at '{}'",
                        global_path.display()
                    )));
                }
                config_manager.save_config_to_path(global_path, &ProbeConfig::default())?;
                writer.write_message(&format!(
                    "Global configuration initialized at '{}'",
                    global_path.display()
                ))?;
            } else {
                let base = match dir {
                    Some(dir) => PathBuf::from(dir),
                    None => std::env::current_dir().map_err(|e| {
                        ProbeError::config(format!("Failed to get current directory: {}", e))
                    })?,
                };
                let path = config_manager.init_project_config(&base)?;
                writer.write_message(&format!(
                    "Project configuration initialized at '{}'",
                    path.display()
                ))?;
            }
            Ok(())
        }
    }
}
