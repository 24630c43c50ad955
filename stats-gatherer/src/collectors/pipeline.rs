use crate::{
    endpoint::{
        self,
        EndpointRegistry,
        NetworkIdentity,
    },
    error::{
        CollectionError,
        CollectionWarning,
    },
    fetcher::{
        EndpointStats,
        StatsFetcher,
        StatsSource,
    },
    metrics::{
        CollectionReport,
        RawStatsBlock,
        ServerMetrics,
    },
};
use chrono::Utc;
use memcached_monitor_config::ServerEndpointConfig;
use std::{
    fmt,
    time::Duration,
};

/// Per-invocation context. Its label tags every log line of the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleContext {
    label: String,
}

impl CycleContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    pub fn numbered(cycle: u64) -> Self {
        Self::new(format!("cycle-{cycle}"))
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for CycleContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Resolve → fetch → correlate → translate. Holds no state between runs.
pub struct CollectionPipeline<S> {
    fetcher: StatsFetcher<S>,
}

impl<S: StatsSource> CollectionPipeline<S> {
    pub fn new(source: S) -> Self {
        Self {
            fetcher: StatsFetcher::new(source),
        }
    }

    #[instrument(name = "collection", skip_all, fields(cycle = %ctx, servers = servers.len()))]
    pub async fn run(
        &self,
        servers: &[ServerEndpointConfig],
        timeout: Duration,
        ctx: &CycleContext,
    ) -> Result<CollectionReport, CollectionError> {
        let mut report = CollectionReport::new(ctx.label().to_string(), Utc::now());

        let registry = endpoint::resolve(servers)?;
        report.warnings.extend_from_slice(registry.warnings());
        if registry.is_empty() {
            info!("No servers configured, nothing to collect");
            return Ok(report.finalize());
        }

        let fetched = self.fetcher.fetch(&registry.identities(), timeout).await?;

        let (correlated, warnings) = correlate(&registry, fetched);
        report.warnings.extend(warnings);
        for (display_name, identity, raw) in correlated {
            let metrics = ServerMetrics::translate(&raw);
            debug!(%display_name, stats = raw.len(), metrics = metrics.len(), "Translated stats");
            if report.result.insert(display_name.clone(), metrics).is_some() {
                warn!(%display_name, %identity, "Display name already collected, keeping the metrics of this server");
                report
                    .warnings
                    .push(CollectionWarning::DuplicateDisplayName { display_name, identity });
            }
        }

        info!(
            collected = report.result.len(),
            warnings = report.warnings.len(),
            "Collection finished"
        );
        Ok(report.finalize())
    }
}

/// Matches every fetched block to its display name. Blocks without a configured name and
/// endpoints that failed become warnings.
pub fn correlate(
    registry: &EndpointRegistry,
    fetched: Vec<EndpointStats>,
) -> (Vec<(String, NetworkIdentity, RawStatsBlock)>, Vec<CollectionWarning>) {
    let mut correlated = Vec::with_capacity(fetched.len());
    let mut warnings = Vec::new();

    for EndpointStats { identity, result } in fetched {
        let Some(display_name) = registry.display_name(&identity) else {
            error!(%identity, "Unable to look up a display name for the stats of this endpoint");
            warnings.push(CollectionWarning::Uncorrelated { identity });
            continue;
        };

        match result {
            Ok(raw) => correlated.push((display_name.to_string(), identity, raw)),
            Err(error) => {
                warn!(%display_name, %identity, %error, "Server skipped for this cycle");
                warnings.push(CollectionWarning::Unreachable {
                    display_name: display_name.to_string(),
                    identity,
                    reason: error.to_string(),
                });
            }
        }
    }

    (correlated, warnings)
}
