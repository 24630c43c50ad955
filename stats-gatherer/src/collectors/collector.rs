use crate::{
    collectors::CycleContext,
    error::CollectionError,
};
use std::{
    future::Future,
    pin::Pin,
};

/// Trait for collecting and formatting data
pub trait Collector {
    /// Run one collection cycle, replacing the data of the previous one
    fn collect(&mut self, ctx: CycleContext) -> Pin<Box<dyn Future<Output = Result<(), CollectionError>> + Send + '_>>;

    /// Format data for display
    fn format(&self) -> String;

    /// Get data summary as JSON
    fn summary(&self) -> serde_json::Value;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}
