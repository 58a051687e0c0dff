//! Transport Layer
//!
//! Everything that touches the network:
//! - `catalog`: id to name table from the simulator's REST API
//! - `frame`: JSON wire messages for both sockets
//! - `reconnect`: backoff policy and link state machine
//! - `throttle`: minimum spacing between display frames
//!
//! Sockets themselves are `tokio-tungstenite` streams owned by the relay
//! loops.

pub mod catalog;
pub mod error;
pub mod frame;
pub mod reconnect;
pub mod throttle;

use std::time::Duration;

use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub use catalog::{CatalogSource, RestCatalog, StaticCatalog};
pub use error::TransportError;
pub use frame::{encode_display_frame, encode_subscribe, InboundMessage, SubscribeRequest};
pub use reconnect::{Link, LinkState, ReconnectPolicy};
pub use throttle::SendThrottle;

/// Client WebSocket used for both links
pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open a WebSocket client connection
///
/// # Errors
///
/// Returns [`TransportError::ConnectionFailed`] if the handshake fails.
pub async fn connect(url: &str) -> Result<Socket, TransportError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| TransportError::ConnectionFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(socket)
}

/// Open a WebSocket client connection within a time limit
///
/// # Errors
///
/// Returns [`TransportError::Timeout`] if the handshake takes longer than
/// `limit`, otherwise as [`connect`].
pub async fn connect_with_timeout(url: &str, limit: Duration) -> Result<Socket, TransportError> {
    tokio::time::timeout(limit, connect(url))
        .await
        .map_err(|_| TransportError::Timeout(limit))?
}
