// Logging module - Logging infrastructure
use crate::domain::error::{ProbeError, ProbeResult};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map a configured level name to a filter directive; unknown names fall back to info
pub fn level_directive(level: &str, verbose: bool) -> &'static str {
    if verbose {
        return "serprobe=debug,warn";
    }
    match level.to_ascii_lowercase().as_str() {
        "error" => "serprobe=error,error",
        "warn" => "serprobe=warn,warn",
        "debug" => "serprobe=debug,warn",
        "trace" => "serprobe=trace,warn",
        _ => "serprobe=info,warn",
    }
}

/// Initialize logging system. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str, verbose: bool) -> ProbeResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level, verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_level(true)
                .with_thread_ids(verbose)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .try_init()
        .map_err(|e| ProbeError::config(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!("SerProbe logging system initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("info", false), "serprobe=info,warn");
        assert_eq!(level_directive("TRACE", false), "serprobe=trace,warn");
        assert_eq!(level_directive("bogus", false), "serprobe=info,warn");
        assert_eq!(level_directive("error", true), "serprobe=debug,warn");
    }

    #[test]
    fn test_logging_init_twice() {
        // Only one subscriber per process; the second call must fail cleanly
        let _ = init_logging("info", false);
        let second = init_logging("info", false);
        assert!(matches!(second, Err(ProbeError::Config { .. })));
    }
}
