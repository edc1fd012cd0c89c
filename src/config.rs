use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::models::ScoringWeights;
use crate::services::EngineOptions;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    /// Matches scoring below this are computed but never persisted.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Decay-band width beyond a price/area bound, as a fraction of it.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Rows shown by `run --request-id`.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_cooldown_days")]
    pub cooldown_days: i64,
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: i64,
    /// Per-request time budget in batch mode; unset means unbounded.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            tolerance: default_tolerance(),
            top_n: default_top_n(),
            cooldown_days: default_cooldown_days(),
            stale_after_hours: default_stale_after_hours(),
            request_timeout_secs: None,
        }
    }
}

impl MatchingSettings {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            request_timeout_secs: self.request_timeout_secs,
            cooldown_days: self.cooldown_days,
            stale_after_hours: self.stale_after_hours,
        }
    }
}

fn default_threshold() -> f64 {
    0.35
}
fn default_tolerance() -> f64 {
    0.20
}
fn default_top_n() -> usize {
    5
}
fn default_cooldown_days() -> i64 {
    7
}
fn default_stale_after_hours() -> i64 {
    24
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_price_weight")]
    pub price: f64,
    #[serde(default = "default_area_weight")]
    pub area: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_sub_category_weight")]
    pub sub_category: f64,
    #[serde(default = "default_features_weight")]
    pub features: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            price: default_price_weight(),
            area: default_area_weight(),
            location: default_location_weight(),
            sub_category: default_sub_category_weight(),
            features: default_features_weight(),
        }
    }
}

impl From<WeightsConfig> for ScoringWeights {
    fn from(value: WeightsConfig) -> Self {
        Self {
            price: value.price,
            area: value.area,
            location: value.location,
            sub_category: value.sub_category,
            features: value.features,
        }
    }
}

fn default_price_weight() -> f64 {
    0.30
}
fn default_area_weight() -> f64 {
    0.25
}
fn default_location_weight() -> f64 {
    0.20
}
fn default_sub_category_weight() -> f64 {
    0.10
}
fn default_features_weight() -> f64 {
    0.15
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Settings {
    /// Load configuration from files and environment variables.
    ///
    /// Later sources override earlier ones:
    /// 1. Struct defaults
    /// 2. config/default.toml
    /// 3. config/local.toml (development overrides)
    /// 4. Environment variables prefixed with EMLAK__
    ///    (e.g. EMLAK__MATCHING__THRESHOLD -> matching.threshold)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("EMLAK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("EMLAK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.price, 0.30);
        assert_eq!(weights.area, 0.25);
        assert_eq!(weights.location, 0.20);
        assert_eq!(weights.sub_category, 0.10);
        assert_eq!(weights.features, 0.15);

        let sum = weights.price + weights.area + weights.location + weights.sub_category + weights.features;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_matching_settings() {
        let matching = MatchingSettings::default();
        assert_eq!(matching.threshold, 0.35);
        assert_eq!(matching.tolerance, 0.20);
        assert_eq!(matching.top_n, 5);
        assert_eq!(matching.cooldown_days, 7);
        assert_eq!(matching.request_timeout_secs, None);
    }

    #[test]
    fn test_engine_options_mapping() {
        let mut matching = MatchingSettings::default();
        matching.request_timeout_secs = Some(30);

        let options = matching.engine_options();
        assert_eq!(options.request_timeout_secs, Some(30));
        assert_eq!(options.cooldown_days, 7);
        assert_eq!(options.stale_after_hours, 24);
    }
}
