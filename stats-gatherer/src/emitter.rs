//! Hand-off of translated metrics to the monitoring platform.

use crate::metrics::{
    CollectionResult,
    Rollup,
};
use memcached_monitor_config::METRIC_SEPARATOR;
use std::io::{
    self,
    Write,
};

pub trait MetricEmitter {
    fn emit(&mut self, path: &str, value: &str, rollup: Rollup) -> io::Result<()>;
}

/// Writes one machine-agent line per metric:
/// `name=<path>,value=<value>,aggregator=<..>,time-rollup=<..>,cluster-rollup=<..>`.
pub struct LineEmitter<W> {
    out: W,
}

impl LineEmitter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> LineEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricEmitter for LineEmitter<W> {
    fn emit(&mut self, path: &str, value: &str, rollup: Rollup) -> io::Result<()> {
        writeln!(
            self.out,
            "name={},value={},aggregator={},time-rollup={},cluster-rollup={}",
            path,
            value,
            rollup.aggregation.as_str(),
            rollup.time_rollup.as_str(),
            rollup.cluster_rollup.as_str()
        )
    }
}

/// Emits every metric of `result` under `prefix + display name + "|" + field name`.
/// Returns the number of metrics emitted.
pub fn emit_result<E: MetricEmitter + ?Sized>(
    prefix: &str,
    result: &CollectionResult,
    emitter: &mut E,
) -> io::Result<usize> {
    let mut emitted = 0;
    for (display_name, metrics) in result {
        for (field, metric) in metrics.iter() {
            let path = format!("{prefix}{display_name}{METRIC_SEPARATOR}{field}");
            debug!("Sending [{}] metric = {} = {}", metric.rollup, path, metric.value);
            emitter.emit(&path, &metric.value, metric.rollup)?;
            emitted += 1;
        }
    }
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{
        RawStatsBlock,
        ServerMetrics,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn lines_carry_path_value_and_rollup() {
        let raw: RawStatsBlock = [("curr_items", "10"), ("cmd_get", "100"), ("version", "1.6.21")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut result = CollectionResult::new();
        result.insert("Cache1".to_string(), ServerMetrics::translate(&raw));

        let mut emitter = LineEmitter::new(Vec::new());
        let emitted = emit_result("Custom Metrics|Memcached|", &result, &mut emitter).unwrap();
        let output = String::from_utf8(emitter.into_inner()).unwrap();

        assert_eq!(emitted, 2);
        assert_eq!(
            output.lines().collect::<Vec<_>>(),
            vec![
                "name=Custom Metrics|Memcached|Cache1|curr_items,value=10,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE",
                "name=Custom Metrics|Memcached|Cache1|cmd_get,value=100,aggregator=OBSERVATION,time-rollup=CURRENT,cluster-rollup=COLLECTIVE",
            ]
        );
    }
}
