//! Display Sender
//!
//! Owns the socket to one display station. Snapshots are decoded just before
//! sending, so a frame always reflects the decoder's view of the snapshot it
//! was built from. A frame that fails to send is requeued ahead of newer
//! frames and retried once the socket reconnects.

use std::fmt;
use std::sync::Arc;

use futures::{Sink, SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use crate::aircraft::AircraftDecoder;
use crate::relay::RelayQueue;
use crate::snapshot::Snapshot;
use crate::transport::{
    self, encode_display_frame, Link, ReconnectPolicy, SendThrottle, Socket, TransportError,
};

/// Reconnecting display loop for one station
pub struct DisplaySender {
    decoder: Arc<dyn AircraftDecoder>,
    url: String,
    policy: ReconnectPolicy,
    queue: RelayQueue<Snapshot>,
    throttle: SendThrottle,
}

impl DisplaySender {
    /// Create a display sender
    ///
    /// The throttle interval is taken from the decoder unless
    /// [`with_throttle`](Self::with_throttle) replaces it.
    #[must_use]
    pub fn new(
        decoder: Arc<dyn AircraftDecoder>,
        url: impl Into<String>,
        policy: ReconnectPolicy,
        queue: RelayQueue<Snapshot>,
    ) -> Self {
        let throttle = SendThrottle::new(decoder.min_send_interval());
        Self {
            decoder,
            url: url.into(),
            policy,
            queue,
            throttle,
        }
    }

    /// Replace the send throttle
    #[must_use]
    pub fn with_throttle(mut self, throttle: SendThrottle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Run forever, reconnecting with backoff
    pub async fn run(mut self) {
        let station = self.decoder.station();
        let mut link = Link::new("display", self.policy.clone());

        loop {
            link.connecting();
            match transport::connect(&self.url).await {
                Ok(socket) => {
                    link.connected();
                    tracing::info!(%station, url = %self.url, "Display connected");
                    let reason = self.stream(socket).await;
                    if reason.is_disconnect() {
                        tracing::info!(%station, "Display closed the connection");
                    } else {
                        tracing::warn!(%station, error = %reason, "Display connection lost");
                    }
                }
                Err(e) => tracing::debug!(%station, error = %e, "Display unavailable"),
            }

            let delay = link.disconnected();
            tokio::time::sleep(delay).await;
        }
    }

    /// Pump queued snapshots into a connected socket until it fails
    async fn stream(&mut self, socket: Socket) -> TransportError {
        let (mut sink, mut incoming) = socket.split();
        let queue = self.queue.clone();

        loop {
            tokio::select! {
                snapshot = queue.pop() => {
                    if let Err(e) = self.deliver(&mut sink, snapshot).await {
                        return e;
                    }
                }
                frame = incoming.next() => match frame {
                    None | Some(Ok(Message::Close(_))) => return TransportError::ConnectionClosed,
                    Some(Err(e)) => return TransportError::ReceiveFailed(e.to_string()),
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    /// Decode, throttle and send one snapshot
    ///
    /// On a send failure the snapshot goes back to the front of the queue.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::SendFailed`] when the sink rejects the frame.
    pub async fn deliver<S>(&mut self, sink: &mut S, snapshot: Snapshot) -> Result<(), TransportError>
    where
        S: Sink<Message> + Unpin,
        S::Error: fmt::Display,
    {
        let grid = self.decoder.decode(&snapshot);
        let frame = match encode_display_frame(&grid) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping frame that failed to encode");
                return Ok(());
            }
        };

        self.throttle.wait().await;
        if let Err(e) = sink.send(Message::Text(frame)).await {
            self.queue.requeue(snapshot);
            return Err(TransportError::SendFailed(e.to_string()));
        }
        self.throttle.mark_sent();
        tracing::debug!(station = %self.decoder.station(), cells = grid.populated(), "Frame sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::ToLissDecoder;
    use crate::station::Station;
    use futures::channel::mpsc;
    use std::time::Duration;

    fn sender(queue: &RelayQueue<Snapshot>) -> DisplaySender {
        DisplaySender::new(
            Arc::new(ToLissDecoder::new(Station::Captain)),
            "ws://127.0.0.1:1/winwing/cdu-captain",
            ReconnectPolicy::default(),
            queue.clone(),
        )
    }

    fn page(title: &str) -> Snapshot {
        [("AirbusFBW/MCDU1title1", title)].into_iter().collect()
    }

    #[tokio::test]
    async fn test_deliver_sends_display_frame() {
        let queue = RelayQueue::new();
        let mut display = sender(&queue);
        let (mut tx, mut rx) = mpsc::unbounded::<Message>();

        display.deliver(&mut tx, page("INIT")).await.unwrap();

        let Some(Message::Text(text)) = rx.next().await else {
            panic!("expected a text frame");
        };
        let frame: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(frame["Target"], "Display");
        assert_eq!(frame["Data"][0], serde_json::json!(["I", "w", 0]));
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_requeues_ahead_of_newer() {
        let queue = RelayQueue::new();
        let mut display = sender(&queue);
        let (mut tx, rx) = mpsc::unbounded::<Message>();
        drop(rx);

        queue.push(page("NEWER"));
        let err = display.deliver(&mut tx, page("OLDER")).await.unwrap_err();
        assert!(matches!(err, TransportError::SendFailed(_)));

        assert_eq!(queue.try_pop(), Some(page("OLDER")));
        assert_eq!(queue.try_pop(), Some(page("NEWER")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_spaces_frames() {
        let queue = RelayQueue::new();
        let mut display =
            sender(&queue).with_throttle(SendThrottle::new(Duration::from_millis(100)));
        let (mut tx, _rx) = mpsc::unbounded::<Message>();

        let start = tokio::time::Instant::now();
        display.deliver(&mut tx, page("A")).await.unwrap();
        display.deliver(&mut tx, page("B")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
