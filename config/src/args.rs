use clap::Parser;
use std::path::PathBuf;

/// Collects memcached statistics and emits them as monitoring metrics.
#[derive(Parser, Debug, Clone)]
#[command(name = "memcached-monitor", author, version, about, long_about = None)]
pub struct Args {
    /// Path to the monitor config file (yaml).
    #[clap(long, value_name = "FILE", env = "MEMCACHED_MONITOR_CONFIG")]
    pub config: PathBuf,

    /// Overrides the batch timeout of the config file, in milliseconds.
    #[clap(long, value_name = "MILLIS")]
    pub timeout: Option<u64>,

    /// Overrides the metric prefix of the config file.
    #[clap(long = "metric-prefix", value_name = "PREFIX")]
    pub metric_prefix: Option<String>,

    /// Repeat the collection on this interval (e.g. "60s", "1m") instead of running once.
    #[clap(long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Print a table per server after each cycle.
    #[clap(long, action)]
    pub table: bool,

    /// Write the last cycle's summary as JSON to this file.
    #[clap(long = "output-file", value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Enables debug logging.
    #[clap(short, long, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(timeout) = self.timeout {
                cache.insert("timeout".to_string(), timeout.into());
            }
            if let Some(metric_prefix) = &self.metric_prefix {
                cache.insert("metric_prefix".to_string(), metric_prefix.clone().into());
            }
            Ok(cache)
        }
    }
}
