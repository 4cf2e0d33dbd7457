//! Motor Fault prediction service
//!
//! Runs both HTTP listeners from one process:
//! - sensor service (default `127.0.0.1:5001`): `/random_input`,
//!   `/random_predict`, `/ws`
//! - prediction service (default `127.0.0.1:5002`): `/predict`
//!
//! # Usage
//!
//! ```bash
//! # Train first, then serve
//! cargo run --release --bin train
//! cargo run --release
//!
//! # Faster replay for demos
//! cargo run --release -- --interval-ms 250
//! ```
//!
//! # Environment Variables
//!
//! - `MOTOR_CONFIG`: Path to a TOML config file
//! - `MOTOR_CORS_ORIGINS`: Comma-separated allowed origins (default: any)
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

use motor_fault::config::{self, MotorConfig};
use motor_fault::server;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "motor-fault")]
#[command(about = "DC motor failure prediction service")]
#[command(version)]
struct CliArgs {
    /// TOML config file (overrides MOTOR_CONFIG / ./motor_config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Sensor service bind address
    #[arg(long, value_name = "HOST:PORT")]
    sensor_addr: Option<String>,

    /// Prediction service bind address
    #[arg(long, value_name = "HOST:PORT")]
    predict_addr: Option<String>,

    /// Trained model artifact
    #[arg(long)]
    model: Option<PathBuf>,

    /// Dataset replayed over the stream
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Delay between streamed rows in milliseconds (0 = no delay)
    #[arg(long)]
    interval_ms: Option<u64>,
}

impl CliArgs {
    fn resolve_config(&self) -> Result<MotorConfig> {
        let mut cfg = match &self.config {
            Some(path) => MotorConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MotorConfig::load(),
        };

        if let Some(addr) = &self.sensor_addr {
            cfg.server.sensor_addr.clone_from(addr);
        }
        if let Some(addr) = &self.predict_addr {
            cfg.server.predict_addr.clone_from(addr);
        }
        if let Some(model) = &self.model {
            cfg.paths.model.clone_from(model);
        }
        if let Some(dataset) = &self.dataset {
            cfg.paths.dataset.clone_from(dataset);
        }
        if let Some(ms) = self.interval_ms {
            cfg.stream.interval_ms = ms;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    config::init(args.resolve_config()?);
    let cfg = config::get();

    info!("Starting Motor Fault prediction service");
    let state = server::load_service_state(cfg)?;

    let sensor_listener = server::bind(&cfg.server.sensor_addr).await?;
    let predict_listener = server::bind(&cfg.server.predict_addr).await?;
    info!(
        sensor = %cfg.server.sensor_addr,
        predict = %cfg.server.predict_addr,
        interval_ms = cfg.stream.interval_ms,
        "Listeners bound"
    );

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set = JoinSet::new();
    server::spawn_services(
        &mut task_set,
        state,
        sensor_listener,
        predict_listener,
        cancel_token.clone(),
    );
    server::run_supervisor(&mut task_set, cancel_token).await?;

    info!("Shutdown complete");
    Ok(())
}
