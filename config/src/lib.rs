#[macro_use]
extern crate tracing;

mod args;
mod server_config;

pub use args::Args;
use color_eyre::Result;
use eyre::{
    eyre,
    Context as _,
};
use serde::{
    Deserialize,
    Serialize,
};
pub use server_config::ServerEndpointConfig;
use std::{
    collections::HashMap,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

/// Separates the segments of an emitted metric path.
pub const METRIC_SEPARATOR: &str = "|";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Namespace prepended to every metric path. Always ends with [`METRIC_SEPARATOR`] once loaded.
    pub metric_prefix: String,
    #[serde(default)]
    pub servers: Vec<ServerEndpointConfig>,
    /// Budget for one whole collection batch, in milliseconds.
    pub timeout: u64,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for MonitorConfig {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl config::Source for MonitorConfig {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let mut cache = HashMap::<String, config::Value>::new();
        cache.insert("metric_prefix".to_string(), self.metric_prefix.clone().into());
        cache.insert("timeout".to_string(), self.timeout.into());
        Ok(cache)
    }
}

/// camelCase top-level keys of older `config.yml` files and the key each one stands for.
const KEY_ALIASES: &[(&str, &str)] = &[("metricPrefix", "metric_prefix")];

/// The yaml config file, with aliased top-level keys folded into their canonical key so that
/// later sources override them like any other key.
#[derive(Clone, Debug)]
struct ConfigFile {
    path: PathBuf,
}

impl config::Source for ConfigFile {
    fn clone_into_box(&self) -> Box<dyn config::Source + Send + Sync> {
        Box::new((*self).clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, config::ConfigError> {
        let file = config::File::from(self.path.as_path())
            .format(config::FileFormat::Yaml)
            .required(true);
        let mut values = config::Source::collect(&file)?;
        for (alias, key) in KEY_ALIASES {
            let Some(value) = values.remove(*alias) else {
                continue;
            };
            if values.contains_key(*key) {
                warn!(alias, key, "Both keys are set in the config file, ignoring the alias");
                continue;
            }
            values.insert(key.to_string(), value);
        }
        Ok(values)
    }
}

impl MonitorConfig {
    /// Layers the built-in defaults, the yaml file at `path` and the command-line overrides.
    #[instrument(level = "debug", skip(args))]
    pub fn load(path: &Path, args: &Args) -> Result<Self> {
        let cfg: Self = config::Config::builder()
            .add_source(Self::default())
            .add_source(ConfigFile {
                path: path.to_path_buf(),
            })
            .add_source(args.clone())
            .build()
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?
            .try_deserialize()
            .wrap_err_with(|| format!("Invalid config file {}", path.display()))?;

        let cfg = cfg.normalized();
        debug!(servers = cfg.servers.len(), timeout = cfg.timeout, prefix = %cfg.metric_prefix, "Loaded config");
        Ok(cfg)
    }

    fn normalized(mut self) -> Self {
        let prefix = self.metric_prefix.trim();
        self.metric_prefix = if prefix.is_empty() || prefix.ends_with(METRIC_SEPARATOR) {
            prefix.to_string()
        } else {
            format!("{prefix}{METRIC_SEPARATOR}")
        };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(eyre!("config.timeout must be greater than zero"));
        }
        if let Some(server) = self.servers.iter().find(|s| s.display_name.trim().is_empty()) {
            return Err(eyre!("config.servers entry {:?} has an empty displayName", server.address));
        }
        if self.servers.is_empty() {
            warn!("No servers configured, collection cycles will be empty");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use temp_dir::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.child("config.yaml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn args_for(path: &Path, extra: &[&str]) -> Args {
        let mut argv = vec!["memcached-monitor", "--config", path.to_str().unwrap()];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn loads_servers_and_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
servers:
  - server: "cache1:11211"
    display_name: "Cache1"
  - server: "cache2"
    display_name: "Cache2"
"#,
        );

        let cfg = MonitorConfig::load(&path, &args_for(&path, &[])).unwrap();
        assert_eq!(
            cfg.servers,
            vec![
                ServerEndpointConfig::new("cache1:11211", "Cache1"),
                ServerEndpointConfig::new("cache2", "Cache2"),
            ]
        );
        assert_eq!(cfg.timeout(), Duration::from_secs(60));
        assert_eq!(cfg.metric_prefix, "Custom Metrics|Memcached|");
        cfg.validate().unwrap();
    }

    #[test]
    fn args_override_file_values() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "metric_prefix: \"Custom Metrics|Cache\"\ntimeout: 5000\n");

        let cfg = MonitorConfig::load(&path, &args_for(&path, &["--timeout", "250"])).unwrap();
        assert_eq!(cfg.timeout, 250);
        // The separator is appended when the prefix lacks it.
        assert_eq!(cfg.metric_prefix, "Custom Metrics|Cache|");

        let cfg = MonitorConfig::load(&path, &args_for(&path, &["--metric-prefix", "Other|"])).unwrap();
        assert_eq!(cfg.metric_prefix, "Other|");
    }

    #[test]
    fn camel_case_keys_of_older_configs_load() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
metricPrefix: "Custom|Mc"
servers:
  - server: "cache1"
    displayName: "Cache1"
"#,
        );

        let cfg = MonitorConfig::load(&path, &args_for(&path, &[])).unwrap();
        assert_eq!(cfg.metric_prefix, "Custom|Mc|");
        assert_eq!(cfg.servers, vec![ServerEndpointConfig::new("cache1", "Cache1")]);

        let cfg = MonitorConfig::load(&path, &args_for(&path, &["--metric-prefix", "Other|"])).unwrap();
        assert_eq!(cfg.metric_prefix, "Other|");
    }

    #[test]
    fn canonical_key_wins_over_its_alias() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "metric_prefix: \"Snake|\"\nmetricPrefix: \"Camel|\"\n");

        let cfg = MonitorConfig::load(&path, &args_for(&path, &[])).unwrap();
        assert_eq!(cfg.metric_prefix, "Snake|");
    }

    #[test]
    fn empty_server_list_is_valid() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "servers: []\n");
        let cfg = MonitorConfig::load(&path, &args_for(&path, &[])).unwrap();
        assert!(cfg.servers.is_empty());
        cfg.validate().unwrap();
    }

    #[test]
    fn missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.child("does-not-exist.yaml");
        assert!(MonitorConfig::load(&path, &args_for(&path, &[])).is_err());
    }

    #[test]
    fn validate_rejects_blank_display_names_and_zero_timeout() {
        let mut cfg = MonitorConfig {
            servers: vec![ServerEndpointConfig::new("cache1", " ")],
            ..MonitorConfig::default()
        };
        assert!(cfg.validate().is_err());

        cfg.servers.clear();
        cfg.timeout = 0;
        assert!(cfg.validate().is_err());
    }
}
