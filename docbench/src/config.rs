//! Configuration for the docbench harness.
//!
//! Settings are merged from multiple sources with the following precedence
//! (highest to lowest):
//!
//! 1. Command-line options
//! 2. Environment variables (prefixed with `DOCBENCH__`)
//! 3. YAML configuration file (specified via `--config`)
//! 4. Defaults
//!
//! The store endpoint and access key have no defaults; a run cannot start
//! without them.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::operation::{Operation, OperationKind};

/// Environment variable prefix for all configuration options.
const ENV_PREFIX: &str = "DOCBENCH__";

/// Newtype around `String` that protects the access key from accidentally
/// being logged along with the rest of the configuration.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AccessKey(String);

impl AccessKey {
    /// The raw key material.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for AccessKey {
    fn from(key: &str) -> Self {
        AccessKey(key.to_string())
    }
}

impl fmt::Debug for AccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[redacted]")
    }
}

/// Settings merged from defaults, the configuration file, and the
/// environment. Command-line options are applied on top by the binary.
#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint URL of the remote document store.
    ///
    /// Required; usually set via `DOCBENCH__ENDPOINT`.
    pub endpoint: Option<String>,

    /// Access key authenticating against the remote store.
    ///
    /// Required; usually set via `DOCBENCH__KEY`.
    pub key: Option<AccessKey>,

    /// The database to exercise.
    pub database: String,

    /// The collection to exercise.
    pub collection: String,

    /// Partition key of the collection. Doubles as the partition key value
    /// for point reads unless overridden on the command line.
    pub partition_key: String,

    /// Throughput to provision the collection with, in capacity units per
    /// second. Also drives worker-count derivation when no explicit
    /// parallelism is set.
    pub throughput: u32,

    /// The operation to benchmark.
    pub operation: OperationKind,

    /// Number of concurrent workers. Derived from `throughput` when unset.
    pub parallelism: Option<usize>,

    /// Total number of operations to run.
    pub number: u64,

    /// The query string run by the query operation.
    pub query: Option<String>,

    /// Delete the database before the run starts.
    pub cleanup_on_start: bool,

    /// Delete the database after the run finishes.
    pub cleanup_on_finish: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            key: None,
            database: "benchmarkdb".into(),
            collection: "orders".into(),
            partition_key: "/customer/state".into(),
            throughput: 1000,
            operation: OperationKind::Insert,
            parallelism: None,
            number: 1000,
            query: None,
            cleanup_on_start: false,
            cleanup_on_finish: false,
        }
    }
}

impl Config {
    /// Loads configuration from defaults, the optional YAML file, and
    /// `DOCBENCH__`-prefixed environment variables, in that order.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = figment::Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }
}

/// The immutable configuration of one experiment run.
///
/// Resolved once from the merged settings before the run starts and read-only
/// thereafter.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Total number of operations to run across all workers.
    pub operations: u64,

    /// Explicit worker count; must be at least 1 when set. When unset, the
    /// worker count is derived from `throughput`.
    pub parallelism: Option<usize>,

    /// Throughput hint used to derive the worker count.
    pub throughput: u32,

    /// The resolved operation to benchmark.
    pub operation: Operation,

    /// Print additional detail about the run.
    pub verbose: bool,

    /// Print records as they are read and written.
    pub record: bool,
}
