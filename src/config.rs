//! Engine configuration
//!
//! Every section has serde defaults, so a YAML file only needs the keys it
//! overrides.

use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Hard ceiling on degrees of separation
pub const MAX_DEGREES: usize = 7;

/// Search limits shared by every algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Ceiling for all-paths enumeration
    pub max_enumerated_paths: usize,
    /// Maximum ranked paths returned per request
    pub max_results: usize,
    /// Wall-clock budget per search in milliseconds
    pub search_timeout_ms: u64,
    /// Iteration budget per search
    pub max_expansions: usize,
    /// Edges weaker than this are dropped when weak connections are excluded
    pub weak_connection_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_enumerated_paths: 1000,
            max_results: 10,
            search_timeout_ms: 5_000,
            max_expansions: 1_000_000,
            weak_connection_threshold: 0.3,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }
}

/// Path confidence tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the hop-count penalty in the confidence formula
    pub length_weight: f64,
    /// Minimum-strength edges below this are flagged as weak links
    pub weak_link_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            length_weight: 1.0,
            weak_link_threshold: 0.4,
        }
    }
}

/// Landmark selection and refresh policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Landmarks to select
    pub count: usize,
    /// Relative node or edge count drift that marks the index stale
    pub staleness_delta: f64,
    /// Background staleness check interval in seconds
    pub refresh_interval_secs: u64,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            count: 16,
            staleness_delta: 0.05,
            refresh_interval_secs: 60,
        }
    }
}

/// Network analytics sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Fraction of nodes used as betweenness sources; 1.0 is exact
    pub betweenness_sample_rate: f64,
    /// Lower bound on betweenness sources
    pub min_betweenness_samples: usize,
    /// Nodes removed when estimating vulnerability
    pub vulnerability_removals: usize,
    /// Node pairs observed per removal
    pub vulnerability_pairs: usize,
    /// RNG seed for all sampling
    pub seed: u64,
    /// Length of the ranked node lists in a report
    pub top_k: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            betweenness_sample_rate: 0.2,
            min_betweenness_samples: 8,
            vulnerability_removals: 16,
            vulnerability_pairs: 64,
            seed: 42,
            top_k: 10,
        }
    }
}

/// Discovery task coordination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub max_concurrent_tasks: usize,
    /// Finished tasks older than this are purged
    pub task_ttl_secs: u64,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 8,
            task_ttl_secs: 600,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub landmarks: LandmarkConfig,
    pub analytics: AnalyticsConfig,
    pub tasks: TaskConfig,
    pub server: ServerConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(yaml: &str) -> EngineResult<Self> {
        let config: EngineConfig =
            serde_yaml::from_str(yaml).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
    }

    /// Reject settings no search could run with
    pub fn validate(&self) -> EngineResult<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.search.weak_connection_threshold) {
            return Err(EngineError::Config("search.weak_connection_threshold must be within [0, 1]".into()));
        }
        if !unit.contains(&self.scoring.weak_link_threshold) {
            return Err(EngineError::Config("scoring.weak_link_threshold must be within [0, 1]".into()));
        }
        if !(self.scoring.length_weight >= 0.0 && self.scoring.length_weight.is_finite()) {
            return Err(EngineError::Config("scoring.length_weight must be a non-negative number".into()));
        }
        if self.search.max_enumerated_paths == 0 || self.search.max_results == 0 {
            return Err(EngineError::Config("search limits must be positive".into()));
        }
        if !(1..=64).contains(&self.landmarks.count) {
            return Err(EngineError::Config("landmarks.count must be within 1..=64".into()));
        }
        if !(self.landmarks.staleness_delta > 0.0 && self.landmarks.staleness_delta.is_finite()) {
            return Err(EngineError::Config("landmarks.staleness_delta must be positive".into()));
        }
        if !(self.analytics.betweenness_sample_rate > 0.0 && self.analytics.betweenness_sample_rate <= 1.0) {
            return Err(EngineError::Config("analytics.betweenness_sample_rate must be within (0, 1]".into()));
        }
        if self.tasks.max_concurrent_tasks == 0 {
            return Err(EngineError::Config("tasks.max_concurrent_tasks must be positive".into()));
        }
        Ok(())
    }
}
