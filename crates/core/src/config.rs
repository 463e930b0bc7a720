use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env_opt(key)
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rank: RankConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            rank: RankConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  rank: cache_capacity={}, outlier_sensitivity={}, outlier_detection={}",
            self.rank.cache_capacity,
            self.rank.outlier_sensitivity,
            self.rank.outlier_detection_enabled,
        );
    }

    /// Structured view of the config for diagnostics output.
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "rank": {
                "cache_capacity": self.rank.cache_capacity,
                "outlier_sensitivity": self.rank.outlier_sensitivity,
                "outlier_detection": self.rank.outlier_detection_enabled,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rank: RankConfig::default(),
        }
    }
}

// ── Ranking engine ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// Number of sort results kept in the LRU cache.
    pub cache_capacity: usize,
    /// Outlier strictness in [0, 1]; higher flags more series as outliers.
    pub outlier_sensitivity: f64,
    /// When false the DBSCAN detector is treated as unavailable and the
    /// engine ranks outlier requests by standard deviation instead.
    pub outlier_detection_enabled: bool,
}

impl RankConfig {
    pub fn from_env() -> Self {
        Self {
            cache_capacity: env_usize("METRISCOPE_SORT_CACHE_CAPACITY", 64),
            outlier_sensitivity: env_f64("METRISCOPE_OUTLIER_SENSITIVITY", 0.5),
            outlier_detection_enabled: env_bool("METRISCOPE_OUTLIER_DETECTION", true),
        }
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 64,
            outlier_sensitivity: 0.5,
            outlier_detection_enabled: true,
        }
    }
}
