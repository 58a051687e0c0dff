//! Dataref Catalog Sources
//!
//! The simulator assigns numeric ids to datarefs per session. The feed loop
//! fetches the id table on every (re)connection and keeps only the entries
//! the aircraft decoder subscribes to.

use std::time::Duration;

use async_trait::async_trait;

use super::frame::{CatalogEntry, CatalogResponse};
use super::TransportError;
use crate::aircraft::AircraftDecoder;
use crate::snapshot::Catalog;

/// Default catalog request timeout
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the id to name table comes from
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the catalog entries relevant to a decoder
    ///
    /// # Errors
    ///
    /// [`TransportError::CatalogFetch`] or [`TransportError::Timeout`] when
    /// the request fails, [`TransportError::CatalogEmpty`] when nothing
    /// matches the decoder.
    async fn fetch(&self, decoder: &dyn AircraftDecoder) -> Result<Catalog, TransportError>;
}

fn filtered(response: CatalogResponse, decoder: &dyn AircraftDecoder) -> Result<Catalog, TransportError> {
    let catalog = response.into_catalog(|name| decoder.subscribes_to(name));
    if catalog.is_empty() {
        return Err(TransportError::CatalogEmpty {
            aircraft: decoder.family().to_string(),
            station: decoder.station().to_string(),
        });
    }
    Ok(catalog)
}

/// Catalog fetched from the simulator's REST API
#[derive(Clone, Debug)]
pub struct RestCatalog {
    url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl RestCatalog {
    /// Create a source for `url` with a request timeout
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::CatalogFetch`] if the HTTP client cannot be
    /// built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let url = url.into();
        // The simulator sits on the local network
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| TransportError::CatalogFetch {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { url, timeout, client })
    }

    /// Catalog URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CatalogSource for RestCatalog {
    async fn fetch(&self, decoder: &dyn AircraftDecoder) -> Result<Catalog, TransportError> {
        let fetch_error = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::CatalogFetch {
                    url: self.url.clone(),
                    reason: e.to_string(),
                }
            }
        };

        let response: CatalogResponse = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(fetch_error)?
            .json()
            .await
            .map_err(fetch_error)?;

        let total = response.data.len();
        let catalog = filtered(response, decoder)?;
        tracing::info!(
            station = %decoder.station(),
            total,
            matched = catalog.len(),
            "Fetched dataref catalog"
        );
        Ok(catalog)
    }
}

/// Fixed catalog, for tests and replay
#[derive(Clone, Debug, Default)]
pub struct StaticCatalog {
    entries: Vec<CatalogEntry>,
}

impl StaticCatalog {
    /// Create from `(id, name)` pairs
    pub fn new<N: Into<String>>(entries: impl IntoIterator<Item = (u64, N)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(id, name)| CatalogEntry { id, name: name.into() })
                .collect(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch(&self, decoder: &dyn AircraftDecoder) -> Result<Catalog, TransportError> {
        filtered(
            CatalogResponse {
                data: self.entries.clone(),
            },
            decoder,
        )
    }
}
