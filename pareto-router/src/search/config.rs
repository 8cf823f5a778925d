//! Search configuration for the Pareto-Dijkstra router.

use std::path::Path;

use serde::Deserialize;

/// Error loading a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid search config: {0}")]
    Invalid(String),
}

/// Configuration parameters for journey search.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of labels popped before the search gives up and
    /// returns what it has found so far.
    pub max_label_count: usize,

    /// Maximum travel time (minutes).
    /// Also bounds the bucket index of the priority queue.
    pub max_travel_time_mins: u32,

    /// Maximum number of transfers.
    pub max_transfers: u32,

    /// Maximum accumulated price, if any.
    pub max_price: Option<u32>,

    /// Keep queue buckets ordered by the full label comparator.
    pub sorted_buckets: bool,

    /// Labels in the first arena block. Later blocks double in size.
    pub arena_block_labels: usize,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_label_count: usize,
        max_travel_time_mins: u32,
        max_transfers: u32,
        max_price: Option<u32>,
    ) -> Self {
        Self {
            max_label_count,
            max_travel_time_mins,
            max_transfers,
            max_price,
            ..Self::default()
        }
    }

    /// Reads a JSON config file. Missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_travel_time_mins == 0 {
            return Err(ConfigError::Invalid(
                "max_travel_time_mins must be positive".into(),
            ));
        }
        if self.arena_block_labels == 0 {
            return Err(ConfigError::Invalid(
                "arena_block_labels must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Returns the largest bucket index the queue needs.
    pub fn max_bucket(&self) -> usize {
        self.max_travel_time_mins as usize
    }

    /// Returns the price cutoff, `u32::MAX` if unlimited.
    pub fn price_limit(&self) -> u32 {
        self.max_price.unwrap_or(u32::MAX)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_label_count: 1_000_000,
            max_travel_time_mins: 1440, // 24 hours
            max_transfers: 6,
            max_price: None,
            sorted_buckets: true,
            arena_block_labels: 4096,
        }
    }
}
