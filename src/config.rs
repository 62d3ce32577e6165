//! Layered configuration.
//!
//! Priority order (highest to lowest): CLI flags, `TREESEAL_*` environment
//! variables, a `treeseal.toml` next to the sealed root (or an explicit
//! `--config` file), built-in defaults.

use crate::error::SealError;
use crate::types::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file looked up next to the sealed root when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "treeseal.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Primary algorithm when the CLI does not pass one.
    pub default_algorithm: String,

    /// Extra entry names to skip, on top of the built-in platform list.
    pub ignore_patterns: Vec<String>,

    /// Bounded size of the hashing worker pool. Unset uses all cores.
    pub hash_pool_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_algorithm: HashAlgorithm::Xxh64.id().to_string(),
            ignore_patterns: Vec::new(),
            hash_pool_size: None,
        }
    }
}

impl Config {
    /// Load configuration for a run rooted at `root`.
    ///
    /// An explicit config file must exist; the default sibling file is
    /// optional. Environment variables override file values.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, SealError> {
        let mut builder = config::Config::builder();
        builder = match explicit {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::from(root.join(CONFIG_FILE_NAME)).required(false)),
        };
        builder = builder.add_source(config::Environment::with_prefix("TREESEAL").try_parsing(true));

        let loaded = builder.build()?;
        let config: Config = loaded.try_deserialize()?;
        // Fail on an unknown algorithm before any filesystem work.
        config.algorithm()?;
        Ok(config)
    }

    /// The configured default algorithm, parsed.
    pub fn algorithm(&self) -> Result<HashAlgorithm, SealError> {
        self.default_algorithm.parse()
    }
}
