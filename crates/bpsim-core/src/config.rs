use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{BpsimError, Result};

/// Top-level bpsim configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Timing and randomness of the simulated work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the delay generator. None draws fresh entropy on every start event.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Fixed pause of a default activity.
    #[serde(default = "default_activity_delay_ms")]
    pub activity_delay_ms: u64,
    /// Lower bound (inclusive) of an active activity's pause.
    #[serde(default = "default_active_min_ms")]
    pub active_min_ms: u64,
    /// Upper bound (inclusive) of an active activity's pause.
    #[serde(default = "default_active_max_ms")]
    pub active_max_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            activity_delay_ms: default_activity_delay_ms(),
            active_min_ms: default_active_min_ms(),
            active_max_ms: default_active_max_ms(),
        }
    }
}

impl SimulationConfig {
    /// All delays zero; useful for tests and `--fast` runs.
    pub fn instant() -> Self {
        Self {
            seed: None,
            activity_delay_ms: 0,
            active_min_ms: 0,
            active_max_ms: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.active_min_ms > self.active_max_ms {
            return Err(BpsimError::Config(format!(
                "simulation.active_min_ms ({}) exceeds simulation.active_max_ms ({})",
                self.active_min_ms, self.active_max_ms
            )));
        }
        Ok(())
    }

    pub fn activity_delay(&self) -> Duration {
        Duration::from_millis(self.activity_delay_ms)
    }

    pub fn active_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.active_min_ms),
            Duration::from_millis(self.active_max_ms),
        )
    }
}

fn default_activity_delay_ms() -> u64 {
    1000
}

fn default_active_min_ms() -> u64 {
    1000
}

fn default_active_max_ms() -> u64 {
    3000
}

/// Logging configuration. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "bpsim=info,warn".to_string()
}

impl AppConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| BpsimError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references
        let expanded = expand_env_vars(&content);

        let config: AppConfig =
            toml::from_str(&expanded).map_err(|e| BpsimError::Config(e.to_string()))?;
        config.simulation.validate()?;
        debug!(path = %path.display(), seed = ?config.simulation.seed, "Loaded configuration");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Substitute `${NAME}` with the value of environment variable `NAME`.
///
/// Unset variables and an unterminated `${` are left in the text as written.
fn expand_env_vars(input: &str) -> String {
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            expanded.push_str(&rest[start..]);
            return expanded;
        };
        let name = &after[..end];
        match std::env::var(name) {
            Ok(value) => expanded.push_str(&value),
            Err(_) => expanded.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    expanded.push_str(rest);
    expanded
}
