//! Runtime Configuration
//!
//! Tuning knobs for the lifetime passes. Values are validated once at
//! runtime construction; passes then trust them.

use thiserror::Error;

/// Upper bound on preallocated capacities, in entries.
///
/// Capacities are starting sizes, not limits; both the worklist and the
/// promotion table grow past them on demand. The bound only rejects
/// configurations that would preallocate absurd amounts up front.
pub const MAX_CAPACITY: usize = 1 << 24;

/// Configuration for an [`ObjectRuntime`](crate::runtime::ObjectRuntime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Initial capacity of the traversal worklist, in entries.
    ///
    /// Sized to the expected depth-times-fanout of interned graphs; deep
    /// chains grow it transparently. Default: 256
    pub worklist_capacity: usize,

    /// Initial capacity of the per-pass promotion table, in entries.
    ///
    /// One entry per object copied during a single interning pass.
    /// Default: 128
    pub promotion_table_capacity: usize,

    /// Whether passes accumulate counters into the runtime's statistics.
    ///
    /// Default: true
    pub track_stats: bool,

    /// Whether pass events are echoed to the console as they happen.
    ///
    /// Events are recorded either way; this only controls console output.
    /// Default: false
    pub verbose: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            // Traversal
            worklist_capacity: 256,
            promotion_table_capacity: 128,
            // Observability
            track_stats: true,
            verbose: false,
        }
    }
}

impl RuntimeConfig {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worklist_capacity == 0 {
            return Err(ConfigError::Worklist(
                "must be greater than zero".to_string(),
            ));
        }
        if self.worklist_capacity > MAX_CAPACITY {
            return Err(ConfigError::Worklist(format!(
                "must not exceed {}",
                MAX_CAPACITY
            )));
        }
        if self.promotion_table_capacity == 0 {
            return Err(ConfigError::PromotionTable(
                "must be greater than zero".to_string(),
            ));
        }
        if self.promotion_table_capacity > MAX_CAPACITY {
            return Err(ConfigError::PromotionTable(format!(
                "must not exceed {}",
                MAX_CAPACITY
            )));
        }
        Ok(())
    }

    /// Build a configuration from `TGC_*` environment variables.
    ///
    /// Unset or unparseable variables silently keep their defaults:
    /// `TGC_WORKLIST_CAPACITY`, `TGC_PROMOTION_TABLE_CAPACITY`,
    /// `TGC_TRACK_STATS`, `TGC_VERBOSE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("TGC_WORKLIST_CAPACITY") {
            if let Ok(parsed) = value.parse() {
                config.worklist_capacity = parsed;
            }
        }
        if let Ok(value) = std::env::var("TGC_PROMOTION_TABLE_CAPACITY") {
            if let Ok(parsed) = value.parse() {
                config.promotion_table_capacity = parsed;
            }
        }
        if let Ok(value) = std::env::var("TGC_TRACK_STATS") {
            match value.as_str() {
                "1" | "true" => config.track_stats = true,
                "0" | "false" => config.track_stats = false,
                _ => {}
            }
        }
        if let Ok(value) = std::env::var("TGC_VERBOSE") {
            match value.as_str() {
                "1" | "true" => config.verbose = true,
                "0" | "false" => config.verbose = false,
                _ => {}
            }
        }

        config
    }
}

/// A configuration field outside its allowed range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worklist capacity {0}")]
    Worklist(String),

    #[error("promotion table capacity {0}")]
    PromotionTable(String),
}
