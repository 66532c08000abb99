//! Configuration file management.
//!
//! Settings load from a TOML file and merge with command-line arguments.
//! Precedence, lowest to highest: built-in defaults, configuration file,
//! CLI arguments.
//!
//! ```toml
//! hosts = ["example.com", "example.com:8443"]
//! output = "table"
//! exit_code = 1
//!
//! [prometheus]
//! enabled = true
//! address = "http://localhost:9091"
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Runtime configuration. Every field is optional so partial configs can
/// be layered; whatever a layer leaves unset falls through to the layer
/// below it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Hosts to check, as `host` or `host:port`
    pub hosts: Option<Vec<String>>,
    /// Output format: text, json, table
    pub output: Option<String>,
    /// Process exit code when any check fails
    pub exit_code: Option<i32>,
    /// Prometheus push-gateway settings
    pub prometheus: Option<PrometheusConfig>,
}

/// Prometheus push-gateway integration settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PrometheusConfig {
    /// Push expiry metrics after each run
    pub enabled: Option<bool>,
    /// Gateway address, e.g. "http://localhost:9091"
    pub address: Option<String>,
}

fn layer<T>(base: &mut Option<T>, over: Option<T>) {
    if over.is_some() {
        *base = over;
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Built-in defaults: table output, exit code 0, metrics disabled.
    pub fn default() -> Self {
        Config {
            hosts: None,
            output: Some("table".into()),
            exit_code: Some(0),
            prometheus: Some(PrometheusConfig {
                enabled: Some(false),
                address: Some("http://localhost:9091".into()),
            }),
        }
    }

    /// Layers another configuration over this one; the other's set fields
    /// win, its unset fields keep the current values.
    pub fn merge_with(mut self, other: Config) -> Self {
        layer(&mut self.hosts, other.hosts);
        layer(&mut self.output, other.output);
        layer(&mut self.exit_code, other.exit_code);
        match (&mut self.prometheus, other.prometheus) {
            (Some(base), Some(over)) => {
                layer(&mut base.enabled, over.enabled);
                layer(&mut base.address, over.address);
            }
            (base @ None, over) => *base = over,
            _ => {}
        }
        self
    }

    /// Lifts CLI arguments into a mergeable configuration; only arguments
    /// the user actually passed override anything.
    pub fn from_cli_args(
        hosts: Option<Vec<String>>,
        output: Option<String>,
        exit_code: Option<i32>,
        prometheus: Option<bool>,
        prometheus_address: Option<String>,
    ) -> Self {
        Config {
            hosts,
            output,
            exit_code,
            prometheus: Some(PrometheusConfig {
                enabled: prometheus,
                address: prometheus_address,
            }),
        }
    }

    /// Renders an example configuration file, for bootstrapping one with
    /// `--init-config`.
    pub fn example_toml() -> String {
        let example = Config {
            hosts: Some(vec![
                "example.com".into(),
                "example.com:8443".into(),
                "expired.badssl.com".into(),
            ]),
            output: Some("table".into()),
            exit_code: Some(1),
            prometheus: Some(PrometheusConfig {
                enabled: Some(true),
                address: Some("http://localhost:9091".into()),
            }),
        };

        toml::to_string_pretty(&example).unwrap_or_else(|_| "# Error generating example".into())
    }
}

/// Errors raised while loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File could not be read
    Io(String),
    /// File is not valid TOML for this schema
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "IO Error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Parse Error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}
