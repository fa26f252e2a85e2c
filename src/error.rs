//! Error types shared by the dashboard subsystem and its configuration layer.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A single OS or vendor query failed for this tick.
    #[error("metric unavailable: {0}")]
    MetricUnavailable(String),

    /// A tracked process exited, or its pid now belongs to another process.
    #[error("process {pid} vanished")]
    ProcessVanished { pid: u32 },

    /// A series no longer lines up with the time axis.
    #[error("series {key} holds {actual} samples but the time axis holds {expected}")]
    InconsistentSeriesLength {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid TOML: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("cannot serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),
}
