//! Decode-and-Relay Pipeline
//!
//! ```text
//!  simulator ──ws──▶ FeedClient ──Snapshot──▶ RelayQueue ──▶ DisplaySender ──ws──▶ display
//!                       │                                       │
//!                  catalog + diff                     decode + throttle + requeue
//! ```
//!
//! The feed and display loops run as separate tasks and only meet at the
//! queue. Either side may disconnect and reconnect without the other
//! noticing.

pub mod display;
pub mod feed;
pub mod pipeline;
pub mod queue;

pub use display::DisplaySender;
pub use feed::{FeedClient, FeedSession};
pub use pipeline::{
    discover_stations, probe_stations, spawn_pipelines, PipelineError, PipelineHandle, StationPipeline,
};
pub use queue::RelayQueue;
