//! CDU Bridge Core - Simulator CDU Pages on WinWing Displays
//!
//! This crate mirrors the control display unit of a simulated airliner onto
//! a WinWing CDU peripheral. It subscribes to the simulator's dataref feed,
//! turns each aircraft's dataref layout into a 14 x 24 character grid and
//! pushes that grid to the peripheral's display socket.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐        ┌───────────────────────────────┐
//! │  Simulator web API           │        │  WinWing display service      │
//! │  GET  /api/v2/datarefs       │        │  ws /winwing/cdu-captain      │
//! │  ws   /api/v2                │        │  ws /winwing/cdu-co-pilot     │
//! └──────┬───────────────┬───────┘        └───────────────▲───────────────┘
//!        │ catalog       │ dataref updates                │ Display frames
//! ┌──────┼───────────────┼────────── StationPipeline ─────┼───────────────┐
//! │      ▼               ▼                                │               │
//! │  ┌─────────────────────────┐   ┌────────────┐   ┌─────┴───────────┐   │
//! │  │       FeedClient        │──▶│ RelayQueue │──▶│  DisplaySender  │   │
//! │  │ catalog, subscribe, diff│   │  Snapshot  │   │ decode, throttle│   │
//! │  └─────────────────────────┘   └────────────┘   └─────────────────┘   │
//! │                 AircraftDecoder (ToLiss, Zibo, FlightFactor, XCrafts) │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`AircraftDecoder`]: Turns a [`Snapshot`] into a [`CellGrid`]
//! - [`AircraftFamily`]: Selects the decoder for the loaded aircraft
//! - [`StationPipeline`]: Feed, queue and display for one station
//! - [`BridgeConfig`]: Merged file, environment and CLI configuration
//!
//! # Module Overview
//!
//! - [`aircraft`]: Per-family dataref decoders
//! - [`config`]: TOML and environment configuration
//! - [`grid`]: The display cell grid and its wire form
//! - [`relay`]: Feed client, relay queue and display sender
//! - [`snapshot`]: Dataref values, snapshots and catalogs
//! - [`station`]: Captain, co-pilot and observer stations
//! - [`transport`]: Sockets, wire frames, catalog fetch and reconnect policy
//!
//! Decoders are pure. All I/O lives in [`transport`] and [`relay`].

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aircraft;
pub mod config;
pub mod grid;
pub mod relay;
pub mod snapshot;
pub mod station;
pub mod transport;

// Re-exports for convenience
pub use aircraft::{
    AircraftDecoder, AircraftFamily, FlightFactorDecoder, ToLissDecoder, XCraftsDecoder,
    ZiboDecoder,
};
pub use grid::{Cell, CellColor, CellGrid, FontSize, Glyph, CELL_COUNT, COLUMNS, ROWS};
pub use snapshot::{Catalog, DatarefValue, DecodeError, Snapshot};
pub use station::Station;

// Relay exports
pub use relay::{
    discover_stations, probe_stations, spawn_pipelines, DisplaySender, FeedClient, PipelineError,
    PipelineHandle, RelayQueue, StationPipeline,
};

// Transport exports
pub use transport::{
    CatalogSource, LinkState, ReconnectPolicy, RestCatalog, SendThrottle, StaticCatalog,
    TransportError,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, BridgeConfig, BridgeToml,
    ConfigError, ConfigOverrides, ConfigSource,
};
