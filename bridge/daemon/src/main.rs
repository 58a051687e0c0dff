//! CDU Bridge Daemon - Simulator CDU Pages on WinWing Displays
//!
//! Relays the loaded aircraft's CDU screens from the simulator's web API to
//! the WinWing display service, one pipeline per reachable station.
//!
//! # Usage
//!
//! ```bash
//! # ToLiss airliner, captain and co-pilot displays on localhost
//! cdu-bridge-daemon
//!
//! # Zibo 737 with the simulator on another machine
//! cdu-bridge-daemon --aircraft zibo --sim-host 192.168.1.20
//!
//! # Captain display only, custom config file
//! cdu-bridge-daemon --station captain --config ./bridge.toml
//!
//! # Verbose logging
//! RUST_LOG=debug cdu-bridge-daemon
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Stop all pipelines and exit

use std::path::PathBuf;

use anyhow::{Context, Result};
use cdu_bridge_core::{
    default_config_path, discover_stations, load_config_from_path, spawn_pipelines,
    AircraftFamily, BridgeConfig, ConfigOverrides, Station,
};
use clap::Parser;
use tracing::info;

/// CDU Bridge Daemon - relays simulator CDU pages to WinWing displays
#[derive(Parser, Debug)]
#[command(name = "cdu-bridge-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "CDU_BRIDGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Aircraft family (toliss, zibo, flightfactor, xcrafts)
    #[arg(short = 'a', long, value_name = "FAMILY")]
    aircraft: Option<AircraftFamily>,

    /// Display station to drive; repeat for several
    #[arg(short = 's', long = "station", value_name = "STATION")]
    stations: Vec<Station>,

    /// Simulator web API host
    #[arg(long, value_name = "HOST")]
    sim_host: Option<String>,

    /// Simulator web API port
    #[arg(long, value_name = "PORT")]
    sim_port: Option<u16>,

    /// WinWing display service host
    #[arg(long, value_name = "HOST")]
    display_host: Option<String>,

    /// WinWing display service port
    #[arg(long, value_name = "PORT")]
    display_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "CDU_BRIDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(aircraft) = self.aircraft {
            overrides = overrides.with_aircraft(aircraft);
        }
        if !self.stations.is_empty() {
            overrides = overrides.with_stations(self.stations.clone());
        }
        if let Some(ref host) = self.sim_host {
            overrides = overrides.with_sim_host(host.clone());
        }
        if let Some(port) = self.sim_port {
            overrides = overrides.with_sim_port(port);
        }
        if let Some(ref host) = self.display_host {
            overrides = overrides.with_display_host(host.clone());
        }
        if let Some(port) = self.display_port {
            overrides = overrides.with_display_port(port);
        }
        overrides
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "cdu_bridge_daemon={level},cdu_bridge_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolve the merged configuration
fn resolve_config(args: &Args) -> Result<BridgeConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, initiating shutdown"),
        _ = sigint.recv() => info!("Received SIGINT, initiating shutdown"),
    }
    Ok(())
}

/// Wait for Ctrl-C
#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl-C handler")?;
    info!("Received Ctrl-C, initiating shutdown");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("CDU bridge starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = resolve_config(&args)?;
    info!(
        source = %config.source(),
        aircraft = %config.aircraft,
        simulator = %config.subscription_url(),
        catalog = %config.catalog_url(),
        "Configuration loaded"
    );
    if let Some(ref path) = config.config_file_path {
        info!(path = %path.display(), "Config file");
    }

    let stations = discover_stations(&config).await;
    let handles = spawn_pipelines(&config, &stations).context("Failed to start pipelines")?;
    for handle in &handles {
        info!(station = %handle.station(), url = %config.display_url(handle.station()), "Relaying");
    }

    shutdown_signal().await?;

    info!("Shutting down...");
    for handle in handles {
        handle.shutdown().await;
    }
    info!("CDU bridge stopped cleanly");
    Ok(())
}
