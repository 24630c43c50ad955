//! # Memcached Stats Gatherer
//!
//! Periodically queries memcached servers for their statistics and converts the raw stat text
//! into typed metrics for a monitoring platform.
//!
//! ## Features
//!
//! - **Binary protocol client**: `STAT` over the memcached binary protocol, one connection per server
//! - **Partial-failure isolation**: servers are queried concurrently under one batch timeout; an
//!   unreachable server only drops its own metrics
//! - **Fixed metric catalogue**: 38 well-known stats, each tagged `OBSERVATION|CURRENT|COLLECTIVE`
//! - **Output**: machine-agent metric lines, terminal tables and JSON export
//!
//! ## Architecture
//!
//! - **`endpoint`**: Resolves `host[:port]` addresses into network identities and display names
//! - **`protocol`**: Binary protocol framing of the stats exchange
//! - **`fetcher`**: Concurrent, deadline-bounded fetching of raw stats per endpoint
//! - **`metrics`**: Raw stats blocks, the stat catalogue and the typed `ServerMetrics`
//! - **`collectors`**: The collection pipeline and the `MemcachedCollector`
//! - **`emitter`**: Metric path construction and metric line output
//!
//! ## Usage
//!
//! ```bash
//! # Collect once and print the metric lines
//! memcached-monitor --config=config.yaml
//!
//! # Collect every minute, show tables and export the last cycle as JSON
//! memcached-monitor --config=config.yaml --interval=1m --table --output-file=metrics.json
//! ```

#[macro_use]
extern crate tracing;

pub mod collectors;
pub mod emitter;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod protocol;

pub use collectors::*;
pub use error::*;
pub use fetcher::{
    BinaryProtocolClient,
    StatsFetcher,
    StatsSource,
};
pub use metrics::*;
