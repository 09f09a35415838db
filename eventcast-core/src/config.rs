use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{model::Coordinates, provider::ProviderId};

/// Map starts over Amsterdam unless configured otherwise.
pub const DEFAULT_LOCATION: Coordinates = Coordinates::new(52.3676, 4.9041);

/// Configuration for a single provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Where the events catalog comes from. No URL means the built-in catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventsConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: crate::provider::nominatim::DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("eventcast/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapConfig {
    pub lat: f64,
    pub lng: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { lat: DEFAULT_LOCATION.lat, lng: DEFAULT_LOCATION.lng }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Optional default provider id, e.g. "openmeteo" or "weatherapi".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.weatherapi]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub map: MapConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    /// Falls back to the keyless Open-Meteo provider when unset.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        match self.default_provider.as_deref() {
            Some(s) => ProviderId::try_from(s),
            None => Ok(ProviderId::OpenMeteo),
        }
    }

    pub fn has_provider(&self, id: ProviderId) -> bool {
        self.providers.contains_key(id.as_str())
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    pub fn default_location(&self) -> Coordinates {
        Coordinates::new(self.map.lat, self.map.lng)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "eventcast", "eventcast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key; the first configured provider becomes the default.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        !provider_id.requires_api_key() || self.provider_api_key(provider_id).is_some()
    }
}
