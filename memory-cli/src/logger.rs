//! Tracing initialisation: fmt layer on stderr, optionally teed into an append-only log file.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Installs the global tracing subscriber.
///
/// The level comes from RUST_LOG (e.g. `info`, `memory_lance=debug`) and defaults to `info`.
/// Load `.env` before calling this, otherwise RUST_LOG from the file is not seen.
/// Command output goes to stdout, so logs are written to stderr.
pub fn init_tracing(log_file_path: Option<&str>) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match log_file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(io::stderr.and(Arc::new(file)))
        }
        None => BoxMakeWriter::new(io::stderr),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
