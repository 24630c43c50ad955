use crate::{
    collectors::{
        CollectionPipeline,
        Collector,
        CycleContext,
    },
    emitter::{
        self,
        MetricEmitter,
    },
    error::CollectionError,
    fetcher::StatsSource,
    metrics::CollectionReport,
};
use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};
use memcached_monitor_config::MonitorConfig;
use std::{
    future::Future,
    io,
    pin::Pin,
};

/// Collects the configured memcached servers and keeps the report of the last successful cycle
pub struct MemcachedCollector<S> {
    config: MonitorConfig,
    pipeline: CollectionPipeline<S>,
    report: Option<CollectionReport>,
}

impl<S: StatsSource> MemcachedCollector<S> {
    pub fn new(config: MonitorConfig, source: S) -> Self {
        Self {
            config,
            pipeline: CollectionPipeline::new(source),
            report: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn report(&self) -> Option<&CollectionReport> {
        self.report.as_ref()
    }

    /// Hands every metric of the last cycle to `emitter`.
    pub fn emit<E: MetricEmitter + ?Sized>(&self, emitter: &mut E) -> io::Result<usize> {
        match &self.report {
            Some(report) => emitter::emit_result(&self.config.metric_prefix, &report.result, emitter),
            None => Ok(0),
        }
    }
}

impl<S: StatsSource> Collector for MemcachedCollector<S> {
    fn collect(&mut self, ctx: CycleContext) -> Pin<Box<dyn Future<Output = Result<(), CollectionError>> + Send + '_>> {
        Box::pin(async move {
            // A failed cycle must not leave the previous cycle's metrics behind.
            self.report = None;
            let report = self
                .pipeline
                .run(&self.config.servers, self.config.timeout(), &ctx)
                .await?;
            self.report = Some(report);
            Ok(())
        })
    }

    fn format(&self) -> String {
        let report = match &self.report {
            Some(r) => r,
            None => return "No metrics collected yet. Call collect() first.".to_string(),
        };

        let mut output = String::new();
        output.push_str(&format!(
            "\nCollection {} at {}\n",
            report.cycle,
            report.collection_start.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for (display_name, metrics) in &report.result {
            let mut table = Table::new();
            table
                .load_preset(presets::UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new(display_name).add_attribute(Attribute::Bold).fg(Color::Cyan),
                    Cell::new("Value").add_attribute(Attribute::Bold),
                ]);

            for (field, metric) in metrics.iter() {
                table.add_row(vec![Cell::new(field.name()), Cell::new(&metric.value)]);
            }
            output.push_str(&format!("{}\n", table));
        }

        for warning in &report.warnings {
            output.push_str(&format!("warning: {warning}\n"));
        }

        output
    }

    fn summary(&self) -> serde_json::Value {
        match &self.report {
            Some(report) => serde_json::json!({
                "collection_info": {
                    "cycle": report.cycle,
                    "start_time": report.collection_start,
                    "end_time": report.collection_end,
                    "metric_prefix": self.config.metric_prefix,
                },
                "servers": report.result,
                "warnings": report.warnings,
            }),
            None => serde_json::Value::Null,
        }
    }

    fn name(&self) -> &'static str {
        "MemcachedCollector"
    }
}
