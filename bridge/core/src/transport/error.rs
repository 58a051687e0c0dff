//! Transport errors shared by the feed and display links

use std::time::Duration;

use thiserror::Error;

/// Failures on the simulator or display connections
///
/// Every variant is recoverable: the owning loop reconnects with backoff.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Could not open a socket
    #[error("Failed to connect to {url}: {reason}")]
    ConnectionFailed {
        /// Endpoint URL
        url: String,
        /// Underlying error
        reason: String,
    },

    /// The peer closed the socket
    #[error("Connection closed by peer")]
    ConnectionClosed,

    /// Writing to the socket failed
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Reading from the socket failed
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// A wire message could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The dataref catalog request failed
    #[error("Catalog fetch from {url} failed: {reason}")]
    CatalogFetch {
        /// Catalog URL
        url: String,
        /// Underlying error
        reason: String,
    },

    /// The simulator published no datarefs for this aircraft
    #[error("No datarefs matched for {aircraft} ({station}); is the aircraft loaded?")]
    CatalogEmpty {
        /// Aircraft family name
        aircraft: String,
        /// Station name
        station: String,
    },

    /// An operation did not finish in time
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Whether the error came from the peer going away rather than a fault
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::ConnectionClosed)
    }
}
