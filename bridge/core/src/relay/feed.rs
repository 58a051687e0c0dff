//! Feed Client
//!
//! Owns the subscription socket to the simulator. Each connection:
//!
//! 1. fetches a fresh catalog for the decoder
//! 2. subscribes to every id in it
//! 3. overlays each pushed message on the running snapshot
//! 4. queues the full snapshot whenever it changed
//!
//! Catalog and snapshot live only as long as the connection. The queue is
//! left alone on reconnect so the display can still receive the last frame.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::aircraft::AircraftDecoder;
use crate::relay::RelayQueue;
use crate::snapshot::{Catalog, Snapshot};
use crate::transport::{
    self, encode_subscribe, CatalogSource, InboundMessage, Link, ReconnectPolicy, TransportError,
};

/// State of one feed connection
#[derive(Debug)]
pub struct FeedSession {
    catalog: Catalog,
    snapshot: Snapshot,
}

impl FeedSession {
    /// Start a session with an empty snapshot
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            snapshot: Snapshot::new(),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Apply one inbound message
    ///
    /// Returns the new snapshot if the message changed anything. Unknown ids
    /// are ignored and values that fail to decode are skipped.
    pub fn apply(&mut self, decoder: &dyn AircraftDecoder, message: &InboundMessage) -> Option<Snapshot> {
        if message.data.is_none() {
            return None;
        }

        let mut candidate = self.snapshot.clone();
        for (id, raw) in message.values() {
            let Some(name) = self.catalog.name(id) else {
                continue;
            };
            match decoder.decode_value(name, raw) {
                Ok(value) => {
                    candidate.insert(name, value);
                }
                Err(e) => tracing::warn!(error = %e, "Skipping dataref update"),
            }
        }

        if candidate == self.snapshot {
            return None;
        }
        self.snapshot = candidate;
        Some(self.snapshot.clone())
    }
}

/// Reconnecting subscription loop for one station
pub struct FeedClient {
    decoder: Arc<dyn AircraftDecoder>,
    catalog: Arc<dyn CatalogSource>,
    url: String,
    policy: ReconnectPolicy,
    queue: RelayQueue<Snapshot>,
}

impl FeedClient {
    /// Create a feed client
    #[must_use]
    pub fn new(
        decoder: Arc<dyn AircraftDecoder>,
        catalog: Arc<dyn CatalogSource>,
        url: impl Into<String>,
        policy: ReconnectPolicy,
        queue: RelayQueue<Snapshot>,
    ) -> Self {
        Self {
            decoder,
            catalog,
            url: url.into(),
            policy,
            queue,
        }
    }

    /// Run forever, reconnecting with backoff
    pub async fn run(self) {
        let station = self.decoder.station();
        let mut link = Link::new("feed", self.policy.clone());

        loop {
            link.connecting();
            match self.run_session(&mut link).await {
                Ok(()) => tracing::info!(%station, "Simulator feed closed"),
                Err(e) => tracing::warn!(%station, error = %e, "Simulator feed failed"),
            }

            let delay = link.disconnected();
            tracing::debug!(%station, ?delay, "Reconnecting to simulator");
            tokio::time::sleep(delay).await;
        }
    }

    async fn run_session(&self, link: &mut Link) -> Result<(), TransportError> {
        let station = self.decoder.station();
        let catalog = self.catalog.fetch(self.decoder.as_ref()).await?;
        let subscribe = encode_subscribe(&catalog)?;

        let mut socket = transport::connect(&self.url).await?;
        socket
            .send(Message::Text(subscribe))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        link.connected();
        tracing::info!(%station, datarefs = catalog.len(), url = %self.url, "Subscribed to simulator");

        let mut session = FeedSession::new(catalog);
        while let Some(frame) = socket.next().await {
            let text = match frame.map_err(|e| TransportError::ReceiveFailed(e.to_string()))? {
                Message::Text(text) => text,
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => continue,
                },
                Message::Close(_) => return Ok(()),
                _ => continue,
            };

            let message = match InboundMessage::parse(&text) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(%station, error = %e, "Skipping malformed simulator message");
                    continue;
                }
            };

            if let Some(snapshot) = session.apply(self.decoder.as_ref(), &message) {
                tracing::debug!(%station, datarefs = snapshot.len(), "Snapshot changed");
                self.queue.push(snapshot);
            }
        }
        Ok(())
    }
}
