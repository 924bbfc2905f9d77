//! Configuration loading and typed config structures for the Lifegrid cluster.
//!
//! The configuration lives in `lifegrid-config.yaml` next to the binaries
//! (or wherever `LIFEGRID_CONFIG` points). Every field is defaulted, so a
//! missing file or an empty document yields a working local setup: a
//! broker on port 8030 and nodes on 8050 upward.

use std::path::{Path, PathBuf};

use lifegrid_types::Params;
use serde::Deserialize;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "LIFEGRID_CONFIG";

/// Config file used when `LIFEGRID_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "lifegrid-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level cluster configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifegridConfig {
    /// Broker server settings.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Compute node settings.
    #[serde(default)]
    pub node: NodeConfig,

    /// Driver settings.
    #[serde(default)]
    pub driver: DriverConfig,

    /// Session parameters used by the driver.
    #[serde(default)]
    pub params: ParamsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifegridConfig {
    /// Load configuration from `LIFEGRID_CONFIG` or `lifegrid-config.yaml`.
    ///
    /// A missing file yields defaults. Environment overrides are applied
    /// either way.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        if path.exists() {
            return Self::from_file(&path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the binaries cannot run with.
    ///
    /// The ticker period feeds `tokio::time::interval`, which needs a
    /// non-zero duration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver.ticker_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "driver.ticker_interval_ms must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Override addresses with environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override addresses from `lookup`, keyed by environment variable name.
    ///
    /// `LIFEGRID_BROKER_ADDR` sets the broker address both the node and the
    /// driver dial. `LIFEGRID_LISTEN_ADDR` sets the listen address of the
    /// broker and the node; each binary reads only its own.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("LIFEGRID_BROKER_ADDR") {
            self.node.broker_addr.clone_from(&val);
            self.driver.broker_addr = val;
        }
        if let Some(val) = lookup("LIFEGRID_LISTEN_ADDR") {
            self.broker.listen_addr.clone_from(&val);
            self.node.listen_addr = val;
        }
        if let Some(val) = lookup("LIFEGRID_ADVERTISE_ADDR") {
            self.node.advertise_addr = Some(val);
        }
    }
}

/// Broker server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BrokerConfig {
    /// Address the broker's RPC server binds.
    #[serde(default = "default_broker_listen_addr")]
    pub listen_addr: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_broker_listen_addr(),
        }
    }
}

/// Compute node settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Address the node's RPC server binds.
    #[serde(default = "default_node_listen_addr")]
    pub listen_addr: String,

    /// Address peers and the broker dial. Defaults to `listen_addr`.
    #[serde(default)]
    pub advertise_addr: Option<String>,

    /// Broker to register with on startup.
    #[serde(default = "default_broker_addr")]
    pub broker_addr: String,
}

impl NodeConfig {
    /// Address the node registers under.
    pub fn advertise_addr(&self) -> &str {
        self.advertise_addr.as_deref().unwrap_or(&self.listen_addr)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_node_listen_addr(),
            advertise_addr: None,
            broker_addr: default_broker_addr(),
        }
    }
}

/// Driver settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DriverConfig {
    /// Broker the driver dials.
    #[serde(default = "default_broker_addr")]
    pub broker_addr: String,

    /// Milliseconds between live-cell polls.
    #[serde(default = "default_ticker_interval_ms")]
    pub ticker_interval_ms: u64,

    /// Directory holding input images named `<W>x<H>.pgm`.
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,

    /// Directory output images are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            broker_addr: default_broker_addr(),
            ticker_interval_ms: default_ticker_interval_ms(),
            image_dir: default_image_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Session parameters as configured. See [`Params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ParamsConfig {
    /// Generations to compute.
    #[serde(default = "default_turns")]
    pub turns: u64,

    /// Worker threads per node.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Grid width.
    #[serde(default = "default_image_size")]
    pub image_width: usize,

    /// Grid height.
    #[serde(default = "default_image_size")]
    pub image_height: usize,
}

impl ParamsConfig {
    /// Session parameters for a run.
    pub const fn to_params(self) -> Params {
        Params {
            turns: self.turns,
            threads: self.threads,
            image_width: self.image_width,
            image_height: self.image_height,
        }
    }
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            threads: default_threads(),
            image_width: default_image_size(),
            image_height: default_image_size(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_broker_listen_addr() -> String {
    "0.0.0.0:8030".to_owned()
}

fn default_node_listen_addr() -> String {
    "127.0.0.1:8050".to_owned()
}

fn default_broker_addr() -> String {
    "127.0.0.1:8030".to_owned()
}

const fn default_ticker_interval_ms() -> u64 {
    2000
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

const fn default_turns() -> u64 {
    10_000_000_000
}

const fn default_threads() -> usize {
    8
}

const fn default_image_size() -> usize {
    512
}

fn default_log_level() -> String {
    "info".to_owned()
}
