use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use tracing::{info, warn};

use retroarcher::chart::chart_types;
use retroarcher::config::{self, Config, load_config, load_config_from_path, save_config};
use retroarcher::locale::{Labels, Locale};
use retroarcher::logging::init_tracing;
use retroarcher::monitor::Monitor;
use retroarcher::system::aggregator::Aggregator;
use retroarcher::system::collector::Collector;
use retroarcher::system::gpu::detect_backends;
use retroarcher::system::sampler::Sampler;
use retroarcher::web::{self, AppState};

#[derive(Parser)]
#[command(
    name = "retroarcher",
    version,
    about = "RetroArcher dashboard server with live hardware-usage charts"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP port, overrides `network.http_port`
    #[arg(long)]
    port: Option<u16>,

    /// Force debug logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Ticks retained per chart series
    #[arg(long)]
    history_length: Option<usize>,

    /// Emit logs as JSON lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (config, config_file) = load_config_for_cli(&cli);
    config.validate()?;

    init_tracing(&config.logging)?;

    if let Some(path) = config_file.filter(|path| !path.exists()) {
        match save_config(&path, &config) {
            Ok(()) => info!(path = %path.display(), "wrote default configuration"),
            Err(err) => warn!(path = %path.display(), error = %err, "cannot write configuration"),
        }
    }

    let metrics = config.dashboard.metrics;
    let collector = Collector::new();
    let root = collector.root_process()?;
    let cpu_name = collector.cpu_brand();
    let gpus = detect_backends();
    let sampler = Sampler::new(collector, gpus, root.identity.pid, metrics);
    let charts = chart_types(metrics, sampler.has_gpus());

    let aggregator = Aggregator::new(config.dashboard.history_length, metrics, root).into_shared();
    let monitor = Monitor::new(sampler, aggregator.clone());
    let ticker = monitor.spawn(Duration::from_millis(config.dashboard.refresh_interval_ms));

    let labels = Labels::new(Locale::from_str_config(&config.general.locale));
    let state = AppState::new(aggregator, labels, cpu_name, charts);
    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    let served = web::serve(listener, state).await;

    ticker.abort();
    served?;
    Ok(())
}

/// Returns the effective config plus the path it should live at.
fn load_config_for_cli(cli: &Cli) -> (Config, Option<PathBuf>) {
    let (mut config, path) = match &cli.config {
        Some(path) => (load_config_from_path(path), Some(path.clone())),
        None => (load_config(), config::config_path()),
    };

    if let Some(port) = cli.port {
        config.network.http_port = port;
    }
    if cli.debug {
        config.logging.debug_logging = true;
    }
    if let Some(history_length) = cli.history_length {
        config.dashboard.history_length = history_length;
    }
    if cli.json_logs {
        config.logging.json = true;
    }

    (config, path)
}
