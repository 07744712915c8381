//! Tracing subscriber setup for the CLI

use std::env;
use std::io;
use tracing_subscriber::{
    fmt::Layer, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Level used until the config file names one
const DEFAULT_LEVEL: &str = "info";

/// Handle to the installed filter, so the configured level can be applied
/// once the config file has been read
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned: bool,
}

impl LogHandle {
    /// Switch to `level` unless `RUST_LOG` or `--verbose` already chose the filter
    pub fn apply_config_level(&self, level: &str) -> anyhow::Result<()> {
        if self.pinned {
            return Ok(());
        }
        self.handle.reload(EnvFilter::try_new(level)?)?;
        Ok(())
    }
}

/// Install the global subscriber.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_logging(verbose: bool, json_format: bool) -> anyhow::Result<LogHandle> {
    let (directive, pinned) = initial_directive(verbose, env::var("RUST_LOG").ok());
    let (filter, handle) = reload::Layer::new(EnvFilter::try_new(directive)?);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(Layer::new().with_writer(io::stderr).with_target(false))
            .try_init()?;
    }

    Ok(LogHandle { handle, pinned })
}

/// Filter directive to start with, and whether it overrides the config level.
///
/// `RUST_LOG` wins, then `--verbose`.
fn initial_directive(verbose: bool, rust_log: Option<String>) -> (String, bool) {
    match rust_log.filter(|value| !value.is_empty()) {
        Some(value) => (value, true),
        None if verbose => ("debug".to_string(), true),
        None => (DEFAULT_LEVEL.to_string(), false),
    }
}
