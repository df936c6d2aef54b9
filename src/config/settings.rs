//! Runtime settings for interactome
//!
//! Supports loading config from:
//! - Built-in defaults
//! - ~/.config/interactome/config.toml (or an explicit path)
//! - Environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved settings used by the cache and the evidence adapters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub cache_ttl_seconds: u64,
    pub request_timeout_seconds: u64,
    /// Minimum gap between two requests to the same host (0 disables)
    pub polite_delay_seconds: f64,
    pub string_api_base: String,
    pub string_caller_identity: String,
    pub string_default_species: u32,
    pub encori_api_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: crate::cache::default_cache_dir(),
            cache_ttl_seconds: 86_400,
            request_timeout_seconds: 30,
            polite_delay_seconds: 0.0,
            string_api_base: "https://string-db.org/api".to_string(),
            string_caller_identity: "API_Interactomes".to_string(),
            string_default_species: 9606,
            encori_api_base: "https://rnasysu.com/encori/api".to_string(),
        }
    }
}

/// On-disk shape: every field optional so a partial file only overrides what it names
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SettingsFile {
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
    pub polite_delay_seconds: Option<f64>,
    #[serde(default)]
    pub string: StringSection,
    #[serde(default)]
    pub encori: EncoriSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StringSection {
    pub api_base: Option<String>,
    pub caller_identity: Option<String>,
    pub default_species: Option<u32>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EncoriSection {
    pub api_base: Option<String>,
}

impl Settings {
    /// Load settings with priority:
    /// 1. Environment variables (highest)
    /// 2. Config file (explicit path, else ~/.config/interactome/config.toml)
    /// 3. Defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = Settings::default();

        match explicit {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                let file: SettingsFile = toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?;
                settings.merge(file);
            }
            None => {
                if let Some(file) = Self::user_config_path()
                    .filter(|p| p.exists())
                    .and_then(|p| std::fs::read_to_string(&p).ok())
                    .and_then(|content| toml::from_str::<SettingsFile>(&content).ok())
                {
                    settings.merge(file);
                }
            }
        }

        settings.apply_env(|name| std::env::var(name).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("interactome").join("config.toml"))
    }

    /// Merge a config file into these settings (file takes priority)
    pub fn merge(&mut self, file: SettingsFile) {
        if let Some(dir) = file.cache_dir {
            self.cache_dir = dir;
        }
        if let Some(ttl) = file.cache_ttl_seconds {
            self.cache_ttl_seconds = ttl;
        }
        if let Some(timeout) = file.request_timeout_seconds {
            self.request_timeout_seconds = timeout;
        }
        if let Some(delay) = file.polite_delay_seconds {
            self.polite_delay_seconds = delay;
        }
        if let Some(base) = file.string.api_base {
            self.string_api_base = base;
        }
        if let Some(identity) = file.string.caller_identity {
            self.string_caller_identity = identity;
        }
        if let Some(species) = file.string.default_species {
            self.string_default_species = species;
        }
        if let Some(base) = file.encori.api_base {
            self.encori_api_base = base;
        }
    }

    /// Apply environment overrides. Values that fail to parse are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("CACHE_DIR") {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(ttl) = lookup("CACHE_TTL_SECONDS").and_then(|v| v.trim().parse().ok()) {
            self.cache_ttl_seconds = ttl;
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECONDS").and_then(|v| v.trim().parse().ok())
        {
            self.request_timeout_seconds = timeout;
        }
        if let Some(delay) = lookup("POLITE_DELAY_SECONDS").and_then(|v| v.trim().parse().ok()) {
            self.polite_delay_seconds = delay;
        }
        if let Some(base) = lookup("STRING_API_BASE") {
            self.string_api_base = base;
        }
        if let Some(identity) = lookup("STRING_CALLER_IDENTITY") {
            self.string_caller_identity = identity;
        }
        if let Some(species) = lookup("STRING_DEFAULT_SPECIES").and_then(|v| v.trim().parse().ok())
        {
            self.string_default_species = species;
        }
        if let Some(base) = lookup("ENCORI_API_BASE") {
            self.encori_api_base = base;
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.polite_delay_seconds.is_finite() || self.polite_delay_seconds < 0.0 {
            anyhow::bail!(
                "polite_delay_seconds must be a non-negative number, got {}",
                self.polite_delay_seconds
            );
        }
        if self.request_timeout_seconds == 0 {
            anyhow::bail!("request_timeout_seconds must be at least 1");
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn polite_delay(&self) -> Duration {
        Duration::from_secs_f64(self.polite_delay_seconds)
    }

    /// Write an example config file if none exists yet
    pub fn init_user_config(path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::user_config_path()
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# interactome configuration
# Environment variables (CACHE_DIR, CACHE_TTL_SECONDS, ...) override these values.

# Where raw upstream responses are cached
# cache_dir = "/home/me/.cache/interactome/responses"

# Cached responses older than this are refetched
cache_ttl_seconds = 86400

request_timeout_seconds = 30

# Minimum seconds between two requests to the same host (0 = off)
polite_delay_seconds = 0.0

[string]
# api_base = "https://string-db.org/api"
# caller_identity = "API_Interactomes"
default_species = 9606

[encori]
# api_base = "https://rnasysu.com/encori/api"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.cache_ttl_seconds, 86_400);
        assert_eq!(settings.request_timeout_seconds, 30);
        assert_eq!(settings.polite_delay(), Duration::ZERO);
        assert_eq!(settings.string_default_species, 9606);
        assert!(settings.cache_dir.ends_with("interactome/responses"));
    }

    #[test]
    fn test_toml_partial_file_overrides_only_named_fields() {
        let toml_str = r#"
cache_ttl_seconds = 60
polite_delay_seconds = 0.5

[string]
default_species = 10090
"#;
        let file: SettingsFile = toml::from_str(toml_str).unwrap();
        let mut settings = Settings::default();
        settings.merge(file);
        assert_eq!(settings.cache_ttl_seconds, 60);
        assert_eq!(settings.polite_delay(), Duration::from_millis(500));
        assert_eq!(settings.string_default_species, 10090);
        assert_eq!(settings.string_api_base, "https://string-db.org/api");
    }

    #[test]
    fn test_toml_parsing_minimal() {
        let file: SettingsFile = toml::from_str("").unwrap();
        let mut settings = Settings::default();
        settings.merge(file);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_env_overrides_file_and_ignores_garbage() {
        let env: HashMap<&str, &str> = [
            ("CACHE_TTL_SECONDS", "120"),
            ("REQUEST_TIMEOUT_SECONDS", "not-a-number"),
            ("ENCORI_API_BASE", "http://localhost:9000/api"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.cache_ttl_seconds, 120);
        assert_eq!(settings.request_timeout_seconds, 30);
        assert_eq!(settings.encori_api_base, "http://localhost:9000/api");
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout_seconds = 5\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        // Environment may still override, but an unset var leaves the file value
        if std::env::var("REQUEST_TIMEOUT_SECONDS").is_err() {
            assert_eq!(settings.request_timeout_seconds, 5);
        }
    }

    #[test]
    fn test_negative_delay_rejected() {
        let settings = Settings {
            polite_delay_seconds: -1.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_init_writes_example_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let written = Settings::init_user_config(Some(&path)).unwrap();
        assert_eq!(written, path);
        let content = std::fs::read_to_string(&path).unwrap();
        let file: SettingsFile = toml::from_str(&content).unwrap();
        assert_eq!(file.cache_ttl_seconds, Some(86400));

        std::fs::write(&path, "cache_ttl_seconds = 1\n").unwrap();
        Settings::init_user_config(Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "cache_ttl_seconds = 1\n");
    }
}
