//! TOML Configuration File Support
//!
//! Configuration lives at `~/.config/cdu-bridge/bridge.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables (`CDU_BRIDGE_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! aircraft = "toliss"
//! stations = ["captain", "co-pilot"]
//!
//! [simulator]
//! host = "localhost"
//! port = 8086
//! catalog_timeout_ms = 5000
//!
//! [display]
//! host = "localhost"
//! port = 8320
//! min_send_interval_ms = 100
//! probe_timeout_ms = 2000
//!
//! [reconnect]
//! initial_backoff_ms = 250
//! max_backoff_ms = 10000
//! backoff_multiplier = 2.0
//! use_jitter = true
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aircraft::{AircraftDecoder, AircraftFamily};
use crate::station::Station;
use crate::transport::ReconnectPolicy;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Aircraft name not recognised
    #[error("Unknown aircraft: {0}")]
    UnknownAircraft(String),

    /// Station name not recognised
    #[error("Unknown station: {0}")]
    UnknownStation(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Simulator section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorToml {
    /// Simulator web API host
    pub host: Option<String>,

    /// Simulator web API port
    pub port: Option<u16>,

    /// Catalog request timeout in milliseconds
    pub catalog_timeout_ms: Option<u64>,
}

/// Display section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayToml {
    /// Peripheral bridge host
    pub host: Option<String>,

    /// Peripheral bridge port
    pub port: Option<u16>,

    /// Minimum spacing between frames in milliseconds
    pub min_send_interval_ms: Option<u64>,

    /// Startup probe timeout in milliseconds
    pub probe_timeout_ms: Option<u64>,
}

/// Reconnect section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectToml {
    /// Delay after the first failure in milliseconds
    pub initial_backoff_ms: Option<u64>,

    /// Delay cap in milliseconds
    pub max_backoff_ms: Option<u64>,

    /// Growth factor per consecutive failure
    pub backoff_multiplier: Option<f64>,

    /// Whether to add jitter
    pub use_jitter: Option<bool>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeToml {
    /// Aircraft family name
    pub aircraft: Option<String>,

    /// Station names
    pub stations: Option<Vec<String>>,

    /// Simulator configuration section
    pub simulator: SimulatorToml,

    /// Display configuration section
    pub display: DisplayToml,

    /// Reconnect configuration section
    pub reconnect: ReconnectToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Simulator endpoint settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Web API host
    pub host: String,
    /// Web API port
    pub port: u16,
    /// Catalog request timeout
    pub catalog_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8086,
            catalog_timeout: Duration::from_secs(5),
        }
    }
}

/// Display peripheral settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Peripheral bridge host
    pub host: String,
    /// Peripheral bridge port
    pub port: u16,
    /// Frame spacing override; the aircraft default applies when unset
    pub min_send_interval: Option<Duration>,
    /// Startup probe timeout per station
    pub probe_timeout: Duration,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8320,
            min_send_interval: None,
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// Complete bridge configuration
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Aircraft to decode
    pub aircraft: AircraftFamily,

    /// Stations to drive, in priority order
    pub stations: Vec<Station>,

    /// Simulator endpoint
    pub simulator: SimulatorConfig,

    /// Display endpoint
    pub display: DisplayConfig,

    /// Backoff for both reconnect loops
    pub reconnect: ReconnectPolicy,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            aircraft: AircraftFamily::ToLiss,
            stations: vec![Station::Captain, Station::CoPilot],
            simulator: SimulatorConfig::default(),
            display: DisplayConfig::default(),
            reconnect: ReconnectPolicy::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl BridgeConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Dataref catalog URL
    #[must_use]
    pub fn catalog_url(&self) -> String {
        format!("http://{}:{}/api/v2/datarefs", self.simulator.host, self.simulator.port)
    }

    /// Subscription socket URL
    #[must_use]
    pub fn subscription_url(&self) -> String {
        format!("ws://{}:{}/api/v2", self.simulator.host, self.simulator.port)
    }

    /// Display socket URL for a station
    #[must_use]
    pub fn display_url(&self, station: Station) -> String {
        format!(
            "ws://{}:{}/winwing/cdu-{}",
            self.display.host,
            self.display.port,
            station.endpoint_name()
        )
    }

    /// Frame spacing for a decoder, honouring the configured override
    #[must_use]
    pub fn min_send_interval(&self, decoder: &dyn AircraftDecoder) -> Duration {
        self.display
            .min_send_interval
            .unwrap_or_else(|| decoder.min_send_interval())
    }

    /// Check the merged configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.simulator.host.trim().is_empty() {
            return invalid("simulator host is empty".to_string());
        }
        if self.display.host.trim().is_empty() {
            return invalid("display host is empty".to_string());
        }
        if self.simulator.port == 0 || self.display.port == 0 {
            return invalid("ports must be non-zero".to_string());
        }
        if self.reconnect.initial_backoff_ms == 0 {
            return invalid("initial_backoff_ms must be positive".to_string());
        }
        if self.reconnect.max_backoff_ms < self.reconnect.initial_backoff_ms {
            return invalid(format!(
                "max_backoff_ms ({}) is below initial_backoff_ms ({})",
                self.reconnect.max_backoff_ms, self.reconnect.initial_backoff_ms
            ));
        }
        let multiplier = self.reconnect.backoff_multiplier;
        if multiplier.is_nan() || multiplier < 1.0 {
            return invalid(format!(
                "backoff_multiplier must be at least 1.0, got {}",
                self.reconnect.backoff_multiplier
            ));
        }
        if self.stations.is_empty() {
            return invalid("no stations configured".to_string());
        }
        if let Some(station) = self.stations.iter().find(|s| !self.aircraft.supports(**s)) {
            return invalid(format!("{} does not drive the {} station", self.aircraft, station));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/cdu-bridge/bridge.toml` or
/// `~/.config/cdu-bridge/bridge.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cdu-bridge").join("bridge.toml"))
}

/// Load configuration from the default path and the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<BridgeConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the environment
///
/// The result is not validated; call [`BridgeConfig::validate`] once CLI
/// overrides have been applied.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<BridgeConfig, ConfigError> {
    load_with_env(path, |key| std::env::var(key).ok())
}

fn load_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<BridgeConfig, ConfigError> {
    let mut config = BridgeConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: BridgeToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

/// Parse a list of station names
fn parse_stations<S: AsRef<str>>(names: &[S]) -> Result<Vec<Station>, ConfigError> {
    names
        .iter()
        .map(|name| {
            name.as_ref()
                .parse::<Station>()
                .map_err(|_| ConfigError::UnknownStation(name.as_ref().to_string()))
        })
        .collect()
}

fn parse_aircraft(name: &str) -> Result<AircraftFamily, ConfigError> {
    name.parse()
        .map_err(|_| ConfigError::UnknownAircraft(name.to_string()))
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut BridgeConfig, toml: &BridgeToml) -> Result<(), ConfigError> {
    if let Some(ref aircraft) = toml.aircraft {
        config.aircraft = parse_aircraft(aircraft)?;
    }
    if let Some(ref stations) = toml.stations {
        config.stations = parse_stations(stations)?;
    }

    // Simulator settings
    if let Some(ref host) = toml.simulator.host {
        config.simulator.host = host.clone();
    }
    if let Some(port) = toml.simulator.port {
        config.simulator.port = port;
    }
    if let Some(timeout) = toml.simulator.catalog_timeout_ms {
        config.simulator.catalog_timeout = Duration::from_millis(timeout);
    }

    // Display settings
    if let Some(ref host) = toml.display.host {
        config.display.host = host.clone();
    }
    if let Some(port) = toml.display.port {
        config.display.port = port;
    }
    if let Some(interval) = toml.display.min_send_interval_ms {
        config.display.min_send_interval = Some(Duration::from_millis(interval));
    }
    if let Some(timeout) = toml.display.probe_timeout_ms {
        config.display.probe_timeout = Duration::from_millis(timeout);
    }

    // Reconnect settings
    if let Some(ms) = toml.reconnect.initial_backoff_ms {
        config.reconnect.initial_backoff_ms = ms;
    }
    if let Some(ms) = toml.reconnect.max_backoff_ms {
        config.reconnect.max_backoff_ms = ms;
    }
    if let Some(multiplier) = toml.reconnect.backoff_multiplier {
        config.reconnect.backoff_multiplier = multiplier;
    }
    if let Some(jitter) = toml.reconnect.use_jitter {
        config.reconnect.use_jitter = jitter;
    }

    Ok(())
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut BridgeConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(aircraft) = env("CDU_BRIDGE_AIRCRAFT") {
        match parse_aircraft(&aircraft) {
            Ok(family) => {
                config.aircraft = family;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring CDU_BRIDGE_AIRCRAFT"),
        }
    }
    if let Some(stations) = env("CDU_BRIDGE_STATIONS") {
        let names: Vec<&str> = stations
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        match parse_stations(&names) {
            Ok(parsed) => {
                config.stations = parsed;
                config.source = ConfigSource::Env;
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring CDU_BRIDGE_STATIONS"),
        }
    }
    if let Some(host) = env("CDU_BRIDGE_SIM_HOST") {
        config.simulator.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("CDU_BRIDGE_SIM_PORT") {
        match port.parse::<u16>() {
            Ok(p) => {
                config.simulator.port = p;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %port, "Ignoring CDU_BRIDGE_SIM_PORT"),
        }
    }
    if let Some(host) = env("CDU_BRIDGE_DISPLAY_HOST") {
        config.display.host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("CDU_BRIDGE_DISPLAY_PORT") {
        match port.parse::<u16>() {
            Ok(p) => {
                config.display.port = p;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %port, "Ignoring CDU_BRIDGE_DISPLAY_PORT"),
        }
    }
    if let Some(interval) = env("CDU_BRIDGE_MIN_SEND_INTERVAL_MS") {
        match interval.parse::<u64>() {
            Ok(ms) => {
                config.display.min_send_interval = Some(Duration::from_millis(ms));
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %interval, "Ignoring CDU_BRIDGE_MIN_SEND_INTERVAL_MS"),
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Aircraft override
    pub aircraft: Option<AircraftFamily>,

    /// Stations override
    pub stations: Option<Vec<Station>>,

    /// Simulator host override
    pub sim_host: Option<String>,

    /// Simulator port override
    pub sim_port: Option<u16>,

    /// Display host override
    pub display_host: Option<String>,

    /// Display port override
    pub display_port: Option<u16>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set aircraft override
    #[must_use]
    pub fn with_aircraft(mut self, aircraft: AircraftFamily) -> Self {
        self.aircraft = Some(aircraft);
        self
    }

    /// Set stations override
    #[must_use]
    pub fn with_stations(mut self, stations: Vec<Station>) -> Self {
        self.stations = Some(stations);
        self
    }

    /// Set simulator host override
    #[must_use]
    pub fn with_sim_host(mut self, host: String) -> Self {
        self.sim_host = Some(host);
        self
    }

    /// Set simulator port override
    #[must_use]
    pub fn with_sim_port(mut self, port: u16) -> Self {
        self.sim_port = Some(port);
        self
    }

    /// Set display host override
    #[must_use]
    pub fn with_display_host(mut self, host: String) -> Self {
        self.display_host = Some(host);
        self
    }

    /// Set display port override
    #[must_use]
    pub fn with_display_port(mut self, port: u16) -> Self {
        self.display_port = Some(port);
        self
    }

    fn is_empty(&self) -> bool {
        self.aircraft.is_none()
            && self.stations.is_none()
            && self.sim_host.is_none()
            && self.sim_port.is_none()
            && self.display_host.is_none()
            && self.display_port.is_none()
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut BridgeConfig) {
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }

        if let Some(aircraft) = self.aircraft {
            config.aircraft = aircraft;
        }
        if let Some(ref stations) = self.stations {
            config.stations = stations.clone();
        }
        if let Some(ref host) = self.sim_host {
            config.simulator.host = host.clone();
        }
        if let Some(port) = self.sim_port {
            config.simulator.port = port;
        }
        if let Some(ref host) = self.display_host {
            config.display.host = host.clone();
        }
        if let Some(port) = self.display_port {
            config.display.port = port;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
