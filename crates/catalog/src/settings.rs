// ABOUTME: Deployment settings for the catalog and the providers that load them.
// ABOUTME: Loading failures degrade to documented defaults instead of surfacing as errors.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SettingsError;

pub const DEFAULT_CACHE_TTL_SECONDS: f64 = 300.0;

/// Per-deployment settings.
///
/// Each field falls back to its own default when missing, null or of the
/// wrong type, so one bad value never discards the rest of the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppSettings {
    /// Ordered failover chain of feed URLs.
    #[serde(alias = "xmlFeedUrls", deserialize_with = "lenient_strings")]
    pub feed_source_urls: Vec<String>,
    /// Only an explicit `false` disables the cache.
    #[serde(alias = "enableXmlCache", deserialize_with = "lenient_enabled")]
    pub cache_enabled: bool,
    #[serde(alias = "xmlCacheSeconds", deserialize_with = "lenient_ttl")]
    pub cache_ttl_seconds: f64,
    #[serde(deserialize_with = "lenient_strings")]
    pub allowed_origins: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            feed_source_urls: Vec::new(),
            cache_enabled: true,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            allowed_origins: Vec::new(),
        }
    }
}

impl AppSettings {
    /// Cache lifetime; negative or non-finite values mean entries are never fresh.
    pub fn cache_ttl(&self) -> Duration {
        if self.cache_ttl_seconds.is_finite() && self.cache_ttl_seconds > 0.0 {
            Duration::try_from_secs_f64(self.cache_ttl_seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_enabled<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(!matches!(Value::deserialize(deserializer)?, Value::Bool(false)))
}

fn lenient_ttl<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(DEFAULT_CACHE_TTL_SECONDS))
}

/// Source of [`AppSettings`] for the current deployment.
pub trait SettingsProvider {
    fn load(&self) -> Result<AppSettings, SettingsError>;
}

/// Settings held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSettings(pub AppSettings);

impl SettingsProvider for StaticSettings {
    fn load(&self) -> Result<AppSettings, SettingsError> {
        Ok(self.0.clone())
    }
}

/// Settings read from a JSON file on every load.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsProvider for FileSettings {
    fn load(&self) -> Result<AppSettings, SettingsError> {
        let json = std::fs::read_to_string(&self.path).map_err(|source| SettingsError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        AppSettings::from_json(&json)
    }
}

/// Loads settings, falling back to [`AppSettings::default`] on any failure.
pub fn load_or_default(provider: &dyn SettingsProvider) -> AppSettings {
    match provider.load() {
        Ok(settings) => settings,
        Err(err) => {
            warn!("using default settings: {}", err);
            AppSettings::default()
        }
    }
}
