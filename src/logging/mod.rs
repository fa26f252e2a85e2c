pub mod redact;

use std::fs;
use std::path::Path;

use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use redact::{RedactingMakeWriter, Redactor};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

const FILE_PREFIX: &str = "retroarcher";

/// Default filter when `RUST_LOG` is unset.
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "debug" } else { "info" }
}

fn env_filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(debug)))
}

fn fmt_layer<W>(writer: W, json: bool, ansi: bool, debug: bool) -> BoxedLayer
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    if json {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(env_filter(debug))
            .boxed()
    } else {
        fmt::layer()
            .with_ansi(ansi)
            .with_writer(writer)
            .with_filter(env_filter(debug))
            .boxed()
    }
}

/// Daily-rotated `retroarcher.<date>.log` files in `dir`, oldest pruned past
/// `max_files`.
pub fn file_appender(dir: &Path, max_files: usize) -> Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(dir)
        .map_err(|e| Error::Logging(format!("cannot open log file in {}: {e}", dir.display())))
}

/// Install the global subscriber: a console layer plus, when enabled, a
/// rotating file layer. `RUST_LOG` overrides the configured level.
pub fn init_tracing(settings: &LoggingConfig) -> Result<()> {
    let redactor = if settings.redact {
        Some(Redactor::new()?)
    } else {
        None
    };

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(
        RedactingMakeWriter::new(std::io::stdout, redactor.clone()),
        settings.json,
        true,
        settings.debug_logging,
    )];

    let log_dir = settings.file.then(|| settings.resolved_log_dir()).flatten();
    if let Some(dir) = &log_dir {
        let appender = file_appender(dir, settings.max_files)?;
        layers.push(fmt_layer(
            RedactingMakeWriter::new(appender, redactor),
            settings.json,
            false,
            settings.debug_logging,
        ));
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| Error::Logging(format!("failed to set tracing subscriber: {e}")))?;

    if let Some(dir) = log_dir {
        info!(dir = %dir.display(), "writing log files");
    }
    Ok(())
}
