use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::instrument::{Category, InstrumentRegistry};
use crate::errors::CoreError;

/// Default instrument configuration shipped with the library.
const BUILTIN_CONFIG: &str = include_str!("../../config/instruments.toml");

/// Days fetched before the requested start so that a trading day exists at or
/// before it, even across long weekends and holidays.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 15;

/// Closing prices move at most once per day, an hour is plenty.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Upper bound for `lookback_days` (about ten years).
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Tunables for the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Lookback buffer subtracted from the requested start date when fetching.
    pub lookback_days: i64,

    /// Lifetime of a cached fetch result. Zero disables caching.
    pub cache_ttl_secs: u64,

    /// Optional API keys for providers that require them.
    /// Keys: provider name (e.g., "alphavantage").
    pub api_keys: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            api_keys: HashMap::new(),
        }
    }
}

impl Settings {
    /// `cache_ttl_secs` as a duration. A value chrono cannot represent
    /// (rejected at load time) disables caching.
    pub fn cache_ttl(&self) -> chrono::Duration {
        ttl_from_secs(self.cache_ttl_secs).unwrap_or_else(chrono::Duration::zero)
    }
}

fn ttl_from_secs(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
}

/// Full application configuration: settings plus the instrument categories.
///
/// Parsed from TOML and validated up front so that misconfiguration fails at
/// load time instead of in the middle of a render pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub settings: Settings,

    pub categories: Vec<Category>,
}

impl AppConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let mut config: AppConfig = toml::from_str(raw)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file (native only, not WASM).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// The configuration bundled with the crate: domestic equities, index
    /// ETFs and foreign equities.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    pub fn registry(&self) -> InstrumentRegistry {
        InstrumentRegistry::new(self.categories.clone())
    }

    fn normalize(&mut self) {
        for category in &mut self.categories {
            category.key = category.key.trim().to_string();
            category.label = category.label.trim().to_string();
            for instrument in &mut category.instruments {
                instrument.code = instrument.code.trim().to_string();
                instrument.name = instrument.name.trim().to_string();
            }
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.categories.is_empty() {
            return Err(CoreError::Config("at least one category is required".into()));
        }
        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.settings.lookback_days) {
            return Err(CoreError::Config(format!(
                "lookback_days must be between 0 and {MAX_LOOKBACK_DAYS} (got {})",
                self.settings.lookback_days
            )));
        }
        if ttl_from_secs(self.settings.cache_ttl_secs).is_none() {
            return Err(CoreError::Config(format!(
                "cache_ttl_secs is out of range (got {})",
                self.settings.cache_ttl_secs
            )));
        }

        let mut keys = HashSet::new();
        for category in &self.categories {
            if category.key.is_empty() {
                return Err(CoreError::Config("category key must not be empty".into()));
            }
            if !keys.insert(category.key.as_str()) {
                return Err(CoreError::Config(format!(
                    "duplicate category key '{}'",
                    category.key
                )));
            }
            if category.instruments.is_empty() {
                return Err(CoreError::Config(format!(
                    "category '{}' has no instruments",
                    category.key
                )));
            }

            let mut names = HashSet::new();
            for instrument in &category.instruments {
                if instrument.code.is_empty() || instrument.name.is_empty() {
                    return Err(CoreError::Config(format!(
                        "category '{}' has an instrument with an empty code or name",
                        category.key
                    )));
                }
                if !names.insert(instrument.name.as_str()) {
                    return Err(CoreError::Config(format!(
                        "duplicate instrument name '{}' in category '{}'",
                        instrument.name, category.key
                    )));
                }
            }
        }
        Ok(())
    }
}
