#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lvapd_core::config::load_from_path;
use lvapd_core::telemetry::{init_tracing, Metrics};
use lvapd_core::Controller;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "lvapd: centralized WiFi LVAP controller")]
struct Cli {
    /// Path to configuration TOML file
    #[arg(short, long, value_name = "FILE", default_value = "config/lvapd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_from_path(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.show_target);
    info!(listen = %config.listen, max_wtps = config.security.max_wtps, "configuration loaded");

    let metrics = match Metrics::new() {
        Ok(metrics) => metrics,
        Err(err) => {
            error!(%err, "failed to register metrics");
            std::process::exit(1);
        }
    };

    let controller = Controller::new(config, metrics);
    let sweeper = {
        let controller = controller.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(5));
            loop {
                interval.tick().await;
                controller.sweep_timeouts().await;
            }
        })
    };

    if let Err(err) = controller.run().await {
        error!(%err, "controller exited with error");
        sweeper.abort();
        std::process::exit(1);
    }
    sweeper.abort();
}
