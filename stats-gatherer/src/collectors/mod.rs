//! # Collectors Module
//!
//! This module contains the collection logic of the monitor.
//!
//! ## Architecture
//!
//! - **`Collector` trait**: Defines the interface for all metric collectors
//! - **`CollectionPipeline`**: One stateless resolve → fetch → correlate → translate run
//! - **`MemcachedCollector`**: Runs the pipeline for the configured servers, keeps the last
//!   report and renders it as a table, as JSON or as emitted metric lines
//!
//! ## Failure handling
//!
//! - A malformed server address or a batch in which no server answered fails the cycle
//! - An unreachable server or an uncorrelated response only adds a warning

pub mod collector;
pub mod memcached_collector;
pub mod pipeline;

// Re-export the main types for easy access
pub use collector::Collector;
pub use memcached_collector::MemcachedCollector;
pub use pipeline::{
    correlate,
    CollectionPipeline,
    CycleContext,
};
