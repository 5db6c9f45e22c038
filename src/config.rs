//! # Retrigger Configuration
//!
//! Layered configuration built with the `config` crate: compiled defaults,
//! then an optional TOML/YAML/JSON file, then `RETRIGGER_*` environment
//! overrides. Nested keys use a double underscore, e.g.
//! `RETRIGGER_SCHEDULER__QUEUE_URL` or `RETRIGGER_TRAVERSAL__GRAPH_FETCH_CONCURRENCY`.
//!
//! ```rust,no_run
//! use taskgraph_retrigger::config::RetriggerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RetriggerConfig::from_env()?;
//! println!("queue at {}", config.scheduler.queue_url);
//! # Ok(())
//! # }
//! ```

use crate::constants::defaults;
use crate::error::{Result, RetriggerError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an optional configuration file
pub const CONFIG_PATH_ENV: &str = "RETRIGGER_CONFIG_PATH";
const ENV_PREFIX: &str = "RETRIGGER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetriggerConfig {
    pub scheduler: SchedulerConfig,
    pub traversal: TraversalConfig,
    /// Build and log the duplicated tasks without submitting them
    pub dry_run: bool,
}

/// Where and how to reach the scheduler's queue and legacy graph APIs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub queue_url: String,
    pub scheduler_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Upper bound on in-flight node reads while walking a legacy task graph
    pub graph_fetch_concurrency: usize,
    /// `limit` sent with each dependents listing request
    pub dependents_page_size: u32,
}

impl Default for RetriggerConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            traversal: TraversalConfig::default(),
            dry_run: false,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            queue_url: defaults::QUEUE_URL.to_string(),
            scheduler_url: defaults::SCHEDULER_URL.to_string(),
            timeout_ms: defaults::REQUEST_TIMEOUT_MS,
            user_agent: format!("taskgraph-retrigger/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            graph_fetch_concurrency: defaults::GRAPH_FETCH_CONCURRENCY,
            dependents_page_size: defaults::DEPENDENTS_PAGE_SIZE,
        }
    }
}

impl RetriggerConfig {
    /// Load defaults, the file named by `RETRIGGER_CONFIG_PATH` (if set) and
    /// environment overrides
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load(path.as_deref(), true)
    }

    /// Load defaults, the given file and environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        Self::load(Some(path), true)
    }

    fn load(path: Option<&Path>, include_env: bool) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading retrigger configuration file");
            builder = builder.add_source(File::from(path).required(true));
        }

        if include_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: RetriggerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            queue_url = %config.scheduler.queue_url,
            scheduler_url = %config.scheduler.scheduler_url,
            timeout_ms = config.scheduler.timeout_ms,
            graph_fetch_concurrency = config.traversal.graph_fetch_concurrency,
            dependents_page_size = config.traversal.dependents_page_size,
            dry_run = config.dry_run,
            "Retrigger configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("scheduler.queue_url", &self.scheduler.queue_url),
            ("scheduler.scheduler_url", &self.scheduler.scheduler_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                RetriggerError::ConfigurationError(format!("Invalid {name} '{value}': {e}"))
            })?;
        }

        if self.scheduler.timeout_ms == 0 {
            return Err(RetriggerError::ConfigurationError(
                "scheduler.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.traversal.graph_fetch_concurrency == 0 {
            return Err(RetriggerError::ConfigurationError(
                "traversal.graph_fetch_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.traversal.dependents_page_size == 0 {
            return Err(RetriggerError::ConfigurationError(
                "traversal.dependents_page_size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
