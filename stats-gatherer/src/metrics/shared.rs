use serde::Serialize;
use std::fmt;

/// How values reported within one interval are combined.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AggregationType {
    Average,
    Sum,
    Observation,
}

/// How values are rolled up into coarser time buckets.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeRollupType {
    Average,
    Sum,
    Current,
}

/// How values of several servers are combined.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClusterRollupType {
    Individual,
    Collective,
}

/// The aggregation / time rollup / cluster rollup triple attached to every metric.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct Rollup {
    pub aggregation: AggregationType,
    pub time_rollup: TimeRollupType,
    pub cluster_rollup: ClusterRollupType,
}

impl Rollup {
    /// Point-in-time observation, reported as-is and summed across the cluster.
    pub const OBSERVED: Rollup = Rollup {
        aggregation: AggregationType::Observation,
        time_rollup: TimeRollupType::Current,
        cluster_rollup: ClusterRollupType::Collective,
    };
}

impl AggregationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationType::Average => "AVERAGE",
            AggregationType::Sum => "SUM",
            AggregationType::Observation => "OBSERVATION",
        }
    }
}

impl TimeRollupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRollupType::Average => "AVERAGE",
            TimeRollupType::Sum => "SUM",
            TimeRollupType::Current => "CURRENT",
        }
    }
}

impl ClusterRollupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterRollupType::Individual => "INDIVIDUAL",
            ClusterRollupType::Collective => "COLLECTIVE",
        }
    }
}

impl fmt::Display for Rollup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.aggregation.as_str(),
            self.time_rollup.as_str(),
            self.cluster_rollup.as_str()
        )
    }
}
