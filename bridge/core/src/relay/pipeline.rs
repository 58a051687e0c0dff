//! Station Pipelines
//!
//! Each reachable display station gets its own feed client, relay queue and
//! display sender. Pipelines share nothing, so one station losing its display
//! never stalls another.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use super::{DisplaySender, FeedClient, RelayQueue};
use crate::config::{BridgeConfig, ConfigError};
use crate::snapshot::Snapshot;
use crate::station::Station;
use crate::transport::{self, CatalogSource, RestCatalog, SendThrottle, TransportError};

/// Errors building a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration cannot drive this station
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A transport component could not be created
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Feed client, queue and display sender for one station
pub struct StationPipeline {
    station: Station,
    queue: RelayQueue<Snapshot>,
    feed: FeedClient,
    display: DisplaySender,
}

impl StationPipeline {
    /// Build a pipeline that fetches its catalog from the simulator
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] if the aircraft does not drive `station`,
    /// [`PipelineError::Transport`] if the HTTP client cannot be created.
    pub fn from_config(config: &BridgeConfig, station: Station) -> Result<Self, PipelineError> {
        let catalog = RestCatalog::new(config.catalog_url(), config.simulator.catalog_timeout)?;
        Self::with_catalog(config, station, Arc::new(catalog))
    }

    /// Build a pipeline around any catalog source
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] if the aircraft does not drive `station`.
    pub fn with_catalog(
        config: &BridgeConfig,
        station: Station,
        catalog: Arc<dyn CatalogSource>,
    ) -> Result<Self, PipelineError> {
        let decoder = config.aircraft.decoder(station).ok_or_else(|| {
            ConfigError::ValidationError(format!("{} does not drive the {} station", config.aircraft, station))
        })?;
        let queue = RelayQueue::new();

        let feed = FeedClient::new(
            Arc::clone(&decoder),
            catalog,
            config.subscription_url(),
            config.reconnect.clone(),
            queue.clone(),
        );
        let throttle = SendThrottle::new(config.min_send_interval(decoder.as_ref()));
        let display = DisplaySender::new(
            Arc::clone(&decoder),
            config.display_url(station),
            config.reconnect.clone(),
            queue.clone(),
        )
        .with_throttle(throttle);

        Ok(Self {
            station,
            queue,
            feed,
            display,
        })
    }

    /// Station this pipeline drives
    #[must_use]
    pub fn station(&self) -> Station {
        self.station
    }

    /// Queue between the feed and the display
    #[must_use]
    pub fn queue(&self) -> &RelayQueue<Snapshot> {
        &self.queue
    }

    /// Start both loops on the runtime
    #[must_use]
    pub fn spawn(self) -> PipelineHandle {
        tracing::info!(station = %self.station, "Starting station pipeline");
        PipelineHandle {
            station: self.station,
            feed: tokio::spawn(self.feed.run()),
            display: tokio::spawn(self.display.run()),
        }
    }
}

/// Running pipeline tasks
#[derive(Debug)]
pub struct PipelineHandle {
    station: Station,
    feed: JoinHandle<()>,
    display: JoinHandle<()>,
}

impl PipelineHandle {
    /// Station this pipeline drives
    #[must_use]
    pub fn station(&self) -> Station {
        self.station
    }

    /// Whether either loop has stopped
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.feed.is_finished() || self.display.is_finished()
    }

    /// Stop both loops
    pub fn abort(&self) {
        self.feed.abort();
        self.display.abort();
    }

    /// Stop both loops and wait for them to unwind
    pub async fn shutdown(self) {
        self.abort();
        for (task, handle) in [("feed", self.feed), ("display", self.display)] {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(station = %self.station, task, "Pipeline task panicked");
                }
            }
        }
        tracing::info!(station = %self.station, "Station pipeline stopped");
    }
}

/// Stations whose display endpoint accepts a connection
///
/// Each configured station is tried once with the configured probe timeout.
pub async fn probe_stations(config: &BridgeConfig) -> Vec<Station> {
    let mut available = Vec::new();
    for &station in &config.stations {
        let url = config.display_url(station);
        match transport::connect_with_timeout(&url, config.display.probe_timeout).await {
            Ok(mut socket) => {
                let _ = socket.close(None).await;
                tracing::info!(%station, %url, "Display station available");
                available.push(station);
            }
            Err(e) => tracing::info!(%station, %url, error = %e, "Display station not reachable"),
        }
    }
    available
}

/// Stations to start pipelines for
///
/// Probes every configured station. When none answers, the first configured
/// station is used anyway and its display loop waits for the peripheral.
pub async fn discover_stations(config: &BridgeConfig) -> Vec<Station> {
    let available = probe_stations(config).await;
    if !available.is_empty() {
        return available;
    }
    match config.stations.first() {
        Some(&station) => {
            tracing::warn!(%station, "No display station answered; waiting on the first configured one");
            vec![station]
        }
        None => Vec::new(),
    }
}

/// Build and start a pipeline for every station
///
/// # Errors
///
/// Returns the first [`PipelineError`]; pipelines already started are
/// aborted.
pub fn spawn_pipelines(config: &BridgeConfig, stations: &[Station]) -> Result<Vec<PipelineHandle>, PipelineError> {
    let mut handles: Vec<PipelineHandle> = Vec::with_capacity(stations.len());
    for &station in stations {
        match StationPipeline::from_config(config, station) {
            Ok(pipeline) => handles.push(pipeline.spawn()),
            Err(e) => {
                handles.iter().for_each(PipelineHandle::abort);
                return Err(e);
            }
        }
    }
    Ok(handles)
}
