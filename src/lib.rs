//! Hardware-usage dashboard for the RetroArcher server.
//!
//! A [`monitor::Monitor`] samples the host once per tick, the
//! [`system::aggregator::Aggregator`] keeps a rolling window of every series,
//! and [`chart`] turns that window into plotly-ready chart descriptions served
//! by [`web`].

pub mod chart;
pub mod config;
pub mod error;
pub mod locale;
pub mod logging;
pub mod monitor;
pub mod system;
pub mod web;

pub use error::{Error, Result};

/// Name the application's own process is charted under.
pub const PRODUCT_NAME: &str = "RetroArcher";
