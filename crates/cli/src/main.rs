mod config_commands;
mod route_commands;

use std::path::{Path, PathBuf};

use {
    clap::{Parser, Subcommand},
    moltis_config::MoltisConfig,
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "moltis", about = "Moltis: reply routing and scoped config tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (defaults to ./moltis.toml, then ~/.config/moltis/).
    #[arg(long, global = true, env = "MOLTIS_CONFIG")]
    config: Option<PathBuf>,

    /// Print collected metrics in Prometheus format on exit.
    #[cfg(feature = "metrics")]
    #[arg(long, global = true, default_value_t = false)]
    metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reply target and scoped config resolution.
    Route {
        #[command(subcommand)]
        action: route_commands::RouteAction,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Load the config named on the command line, or discover one.
pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<MoltisConfig> {
    match path {
        Some(path) => Ok(moltis_config::load_config(path)?),
        None => Ok(moltis_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "moltis starting");

    #[cfg(feature = "metrics")]
    let metrics = moltis_metrics::init_metrics(moltis_metrics::MetricsRecorderConfig {
        enabled: cli.metrics,
        global_labels: Vec::new(),
    })?;

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Route { action } => route_commands::handle_route(action, config_path).await,
        Commands::Config { action } => config_commands::handle_config(action, config_path).await,
    };

    #[cfg(feature = "metrics")]
    if cli.metrics {
        eprint!("{}", metrics.render());
    }

    result
}
