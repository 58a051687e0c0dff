//! Integration tests for the relay pipeline
//!
//! These tests run the feed client, display sender and catalog source against
//! local stand-ins for the simulator and the display service.
//! Tests cover:
//! - Catalog fetch over HTTP with filtering and name trimming
//! - Subscription, change detection and queueing on the feed socket
//! - Display delivery across a dropped display connection
//! - Station probing against a display service with one endpoint
//! - A full station pipeline from simulator to display

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, accept_hdr_async, WebSocketStream};

use cdu_bridge_core::config::BridgeConfig;
use cdu_bridge_core::relay::{
    discover_stations, probe_stations, DisplaySender, FeedClient, RelayQueue, StationPipeline,
};
use cdu_bridge_core::transport::{
    CatalogSource, ReconnectPolicy, RestCatalog, SendThrottle, StaticCatalog, TransportError,
};
use cdu_bridge_core::{Snapshot, Station, ToLissDecoder};

const WAIT: Duration = Duration::from_secs(5);

// =============================================================================
// Helpers
// =============================================================================

fn fast_policy() -> ReconnectPolicy {
    ReconnectPolicy::new()
        .with_initial_backoff_ms(10)
        .with_max_backoff_ms(50)
        .with_jitter(false)
}

fn captain() -> Arc<ToLissDecoder> {
    Arc::new(ToLissDecoder::new(Station::Captain))
}

fn title_update(id: u64, title: &str) -> String {
    format!(r#"{{"data":{{"{id}":"{}"}}}}"#, BASE64_STANDARD.encode(title))
}

fn page(title: &str) -> Snapshot {
    [("AirbusFBW/MCDU1title1", title)].into_iter().collect()
}

async fn local_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("no connection")
        .unwrap();
    accept_async(stream).await.unwrap()
}

async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        let frame = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("no frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Answer a single HTTP request with `status` and `body`, returning the request head
fn serve_http_once(listener: TcpListener, status: &'static str, body: String) -> JoinHandle<String> {
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        String::from_utf8_lossy(&head).into_owned()
    })
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_rest_catalog_filters_and_trims() {
    let (listener, addr) = local_listener().await;
    let body = json!({
        "data": [
            { "id": 11, "name": "AirbusFBW/MCDU1title1  " },
            { "id": 12, "name": "AirbusFBW/MCDU2title1" },
            { "id": 13, "name": "sim/time/zulu_time_sec" },
            { "id": 14, "name": "AirbusFBW/MCDU1cont1b" }
        ]
    })
    .to_string();
    let server = serve_http_once(listener, "200 OK", body);

    let catalog = RestCatalog::new(format!("http://{addr}/api/v2/datarefs"), WAIT).unwrap();
    let result = catalog.fetch(captain().as_ref()).await.unwrap();

    assert_eq!(result.ids(), vec![11, 14]);
    assert_eq!(result.name(11), Some("AirbusFBW/MCDU1title1"));
    let head = server.await.unwrap();
    assert!(head.starts_with("GET /api/v2/datarefs HTTP/1.1"), "{head}");
}

#[tokio::test]
async fn test_rest_catalog_without_matches_is_empty() {
    let (listener, addr) = local_listener().await;
    let body = json!({ "data": [{ "id": 1, "name": "laminar/B738/fmc1/Line00_L" }] }).to_string();
    let _server = serve_http_once(listener, "200 OK", body);

    let catalog = RestCatalog::new(format!("http://{addr}/api/v2/datarefs"), WAIT).unwrap();
    let err = catalog.fetch(captain().as_ref()).await.unwrap_err();
    assert!(matches!(err, TransportError::CatalogEmpty { .. }), "{err}");
}

#[tokio::test]
async fn test_rest_catalog_http_error() {
    let (listener, addr) = local_listener().await;
    let _server = serve_http_once(listener, "500 Internal Server Error", "{}".to_string());

    let catalog = RestCatalog::new(format!("http://{addr}/api/v2/datarefs"), WAIT).unwrap();
    let err = catalog.fetch(captain().as_ref()).await.unwrap_err();
    assert!(matches!(err, TransportError::CatalogFetch { .. }), "{err}");
}

// =============================================================================
// Feed
// =============================================================================

#[tokio::test]
async fn test_feed_subscribes_and_queues_changes() {
    let (listener, addr) = local_listener().await;
    let simulator = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let request = next_json(&mut ws).await;

        let init = title_update(1, "INIT");
        for frame in [
            init.clone(),
            r#"{"req_id":1,"success":true}"#.to_string(),
            init,
            "not json".to_string(),
            title_update(1, "PERF"),
        ] {
            ws.send(Message::Text(frame)).await.unwrap();
        }
        while let Some(Ok(_)) = ws.next().await {}
        request
    });

    let queue = RelayQueue::new();
    let catalog = StaticCatalog::new([
        (1, "AirbusFBW/MCDU1title1"),
        (2, "AirbusFBW/MCDU2title1"),
        (3, "sim/time/zulu_time_sec"),
    ]);
    let feed = FeedClient::new(
        captain(),
        Arc::new(catalog),
        format!("ws://{addr}/api/v2"),
        fast_policy(),
        queue.clone(),
    );
    let task = tokio::spawn(feed.run());

    let first = tokio::time::timeout(WAIT, queue.pop()).await.unwrap();
    assert_eq!(first.text("AirbusFBW/MCDU1title1"), Some("INIT"));
    let second = tokio::time::timeout(WAIT, queue.pop()).await.unwrap();
    assert_eq!(second.text("AirbusFBW/MCDU1title1"), Some("PERF"));
    assert!(queue.is_empty());

    task.abort();
    let request = simulator.await.unwrap();
    assert_eq!(
        request,
        json!({
            "type": "dataref_subscribe_values",
            "req_id": 1,
            "params": { "datarefs": [{ "id": 1 }] }
        })
    );
}

#[tokio::test]
async fn test_feed_resubscribes_after_disconnect() {
    let (listener, addr) = local_listener().await;
    let queue = RelayQueue::new();
    let feed = FeedClient::new(
        captain(),
        Arc::new(StaticCatalog::new([(1, "AirbusFBW/MCDU1title1")])),
        format!("ws://{addr}/api/v2"),
        fast_policy(),
        queue.clone(),
    );
    let task = tokio::spawn(feed.run());

    let mut first = accept_ws(&listener).await;
    next_json(&mut first).await;
    first.send(Message::Text(title_update(1, "INIT"))).await.unwrap();
    drop(first);

    let mut second = accept_ws(&listener).await;
    let request = next_json(&mut second).await;
    assert_eq!(request["type"], "dataref_subscribe_values");

    // Fresh session, so the same page counts as a change again
    second.send(Message::Text(title_update(1, "INIT"))).await.unwrap();
    let a = tokio::time::timeout(WAIT, queue.pop()).await.unwrap();
    let b = tokio::time::timeout(WAIT, queue.pop()).await.unwrap();
    assert_eq!(a, b);

    task.abort();
}

// =============================================================================
// Display
// =============================================================================

#[tokio::test]
async fn test_display_delivers_across_reconnect() {
    let (listener, addr) = local_listener().await;
    let queue = RelayQueue::new();
    let sender = DisplaySender::new(
        captain(),
        format!("ws://{addr}/winwing/cdu-captain"),
        fast_policy(),
        queue.clone(),
    )
    .with_throttle(SendThrottle::new(Duration::ZERO));
    let task = tokio::spawn(sender.run());

    let mut first = accept_ws(&listener).await;
    queue.push(page("INIT"));
    let frame = next_json(&mut first).await;
    assert_eq!(frame["Target"], "Display");
    assert_eq!(frame["Data"].as_array().unwrap().len(), 14 * 24);
    assert_eq!(frame["Data"][0], json!(["I", "w", 0]));

    first.close(None).await.unwrap();
    let _ = tokio::time::timeout(WAIT, async { while let Some(Ok(_)) = first.next().await {} }).await;

    queue.push(page("PERF"));
    let mut second = accept_ws(&listener).await;
    let frame = next_json(&mut second).await;
    assert_eq!(frame["Data"][0], json!(["P", "w", 0]));
    assert!(queue.is_empty());

    task.abort();
}

// =============================================================================
// Probing
// =============================================================================

/// Display service that only serves the captain endpoint
async fn captain_only_display() -> SocketAddr {
    let (listener, addr) = local_listener().await;
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let callback = |request: &Request, response: Response| {
                    if request.uri().path() == "/winwing/cdu-captain" {
                        Ok(response)
                    } else {
                        let mut error = ErrorResponse::new(Some("unknown station".to_string()));
                        *error.status_mut() = StatusCode::NOT_FOUND;
                        Err(error)
                    }
                };
                if let Ok(mut ws) = accept_hdr_async(stream, callback).await {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });
    addr
}

fn display_config(addr: SocketAddr) -> BridgeConfig {
    let mut config = BridgeConfig::default();
    config.display.host = addr.ip().to_string();
    config.display.port = addr.port();
    config.display.probe_timeout = Duration::from_secs(2);
    config
}

#[tokio::test]
async fn test_probe_finds_reachable_stations() {
    let addr = captain_only_display().await;
    let mut config = display_config(addr);
    config.stations = vec![Station::CoPilot, Station::Captain];

    assert_eq!(probe_stations(&config).await, vec![Station::Captain]);
    assert_eq!(discover_stations(&config).await, vec![Station::Captain]);
}

#[tokio::test]
async fn test_discover_without_reachable_station() {
    let addr = captain_only_display().await;
    let mut config = display_config(addr);
    config.stations = vec![Station::CoPilot];

    assert!(probe_stations(&config).await.is_empty());
    assert_eq!(discover_stations(&config).await, vec![Station::CoPilot]);
}

// =============================================================================
// Full pipeline
// =============================================================================

#[tokio::test]
async fn test_station_pipeline_end_to_end() {
    let (sim_listener, sim_addr) = local_listener().await;
    let (display_listener, display_addr) = local_listener().await;

    let mut config = BridgeConfig::default();
    config.simulator.host = sim_addr.ip().to_string();
    config.simulator.port = sim_addr.port();
    config.display.host = display_addr.ip().to_string();
    config.display.port = display_addr.port();
    config.display.min_send_interval = Some(Duration::ZERO);
    config.reconnect = fast_policy();

    let catalog = StaticCatalog::new([(7, "AirbusFBW/MCDU1title1"), (8, "AirbusFBW/MCDU1stitle")]);
    let handle = StationPipeline::with_catalog(&config, Station::Captain, Arc::new(catalog))
        .unwrap()
        .spawn();

    let mut display = accept_ws(&display_listener).await;
    let mut simulator = accept_ws(&sim_listener).await;
    let request = next_json(&mut simulator).await;
    assert_eq!(request["params"]["datarefs"], json!([{ "id": 7 }, { "id": 8 }]));

    simulator
        .send(Message::Text(title_update(7, "MCDU MENU")))
        .await
        .unwrap();

    let frame = next_json(&mut display).await;
    let row: String = (0..24)
        .map(|i| frame["Data"][i][0].as_str().unwrap_or(" ").to_string())
        .collect();
    assert!(row.contains("MCDU MENU"), "{row:?}");

    handle.shutdown().await;
}
