use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Provider;

pub const CONFIG_FILE_NAME: &str = "modelgate.toml";
pub const DB_FILE_NAME: &str = "modelgate.db";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

pub const MASTER_SECRET_ENV: &str = "MODELGATE_SECRET_KEY";
pub const CACHE_TTL_ENV: &str = "MODELGATE_CACHE_TTL_SECS";

/// Environment-default API keys, the last level of the credential fallback
/// chain.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<String>,
}

impl ProviderKeys {
    /// The configured key for `provider`. Empty strings count as unset.
    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Anthropic => self.anthropic.as_deref(),
            Provider::OpenAi => self.openai.as_deref(),
            Provider::Google => self.google.as_deref(),
        };
        key.filter(|k| !k.is_empty())
    }

    pub fn set(&mut self, provider: Provider, key: Option<String>) {
        let slot = match provider {
            Provider::Anthropic => &mut self.anthropic,
            Provider::OpenAi => &mut self.openai,
            Provider::Google => &mut self.google,
        };
        *slot = key;
    }

    /// Environment variable holding the default key for `provider`.
    #[must_use]
    pub const fn env_var(provider: Provider) -> &'static str {
        match provider {
            Provider::Anthropic => "ANTHROPIC_API_KEY",
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Google => "GOOGLE_API_KEY",
        }
    }
}

impl std::fmt::Debug for ProviderKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for provider in Provider::ALL {
            if self.get(provider).is_some() {
                list.entry(&provider.as_str());
            }
        }
        list.finish()
    }
}

/// On-disk shape of `modelgate.toml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    master_secret: Option<String>,
    cache_ttl_secs: Option<u64>,
    #[serde(default)]
    provider_keys: ProviderKeys,
}

#[derive(Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub master_secret: Option<String>,
    pub cache_ttl: Duration,
    pub provider_keys: ProviderKeys,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("data_dir", &self.data_dir)
            .field("master_secret", &self.master_secret.as_ref().map(|_| "<redacted>"))
            .field("cache_ttl", &self.cache_ttl)
            .field("provider_keys", &self.provider_keys)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            master_secret: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            provider_keys: ProviderKeys::default(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `<data_dir>/modelgate.toml` if present, then the process
    /// environment.
    pub fn load<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let mut config = Self::from_dir(data_dir)?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Defaults overlaid with the config file only.
    pub fn from_dir<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let mut config = Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        };

        let path = config.config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let file: ConfigFile = toml::from_str(&content)
                .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

            if file.master_secret.is_some() {
                config.master_secret = file.master_secret;
            }
            if let Some(secs) = file.cache_ttl_secs {
                config.cache_ttl = Duration::from_secs(secs);
            }
            for provider in Provider::ALL {
                if let Some(key) = file.provider_keys.get(provider) {
                    config.provider_keys.set(provider, Some(key.to_string()));
                }
            }
            tracing::debug!("Loaded configuration from {}", path.display());
        }

        Ok(config)
    }

    /// Overlays values from `lookup`, normally `std::env::var`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(secret) = lookup(MASTER_SECRET_ENV).filter(|s| !s.is_empty()) {
            self.master_secret = Some(secret);
        }

        if let Some(raw) = lookup(CACHE_TTL_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{CACHE_TTL_ENV} must be a whole number of seconds"))
            })?;
            self.cache_ttl = Duration::from_secs(secs);
        }

        for provider in Provider::ALL {
            if let Some(key) = lookup(ProviderKeys::env_var(provider)).filter(|k| !k.is_empty()) {
                self.provider_keys.set(provider, Some(key));
            }
        }

        Ok(())
    }

    /// The master secret, or a configuration error when it is missing.
    pub fn require_master_secret(&self) -> Result<&str> {
        match self.master_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(secret),
            _ => Err(Error::Config(format!(
                "no master secret configured; set {MASTER_SECRET_ENV} or master_secret in {CONFIG_FILE_NAME}"
            ))),
        }
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::from_dir(temp.path()).unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert!(config.master_secret.is_none());
        assert_eq!(config.db_path(), temp.path().join("modelgate.db"));
        assert!(matches!(config.require_master_secret(), Err(Error::Config(_))));
    }

    #[test]
    fn test_file_then_env_precedence() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            r#"
master_secret = "from-file"
cache_ttl_secs = 60

[provider_keys]
openai = "sk-file"
google = "g-file"
"#,
        )
        .unwrap();

        let mut config = AppConfig::from_dir(temp.path()).unwrap();
        assert_eq!(config.require_master_secret().unwrap(), "from-file");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));

        config
            .apply_env(env(&[
                ("MODELGATE_SECRET_KEY", "from-env"),
                ("OPENAI_API_KEY", "sk-env"),
                ("ANTHROPIC_API_KEY", ""),
            ]))
            .unwrap();

        assert_eq!(config.require_master_secret().unwrap(), "from-env");
        assert_eq!(config.provider_keys.get(Provider::OpenAi), Some("sk-env"));
        assert_eq!(config.provider_keys.get(Provider::Google), Some("g-file"));
        assert_eq!(config.provider_keys.get(Provider::Anthropic), None);
    }

    #[test]
    fn test_invalid_ttl_env() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env(&[("MODELGATE_CACHE_TTL_SECS", "soon")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "master_secret = [").unwrap();
        assert!(matches!(
            AppConfig::from_dir(temp.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = AppConfig::default();
        config.master_secret = Some("hunter2".to_string());
        config.provider_keys.openai = Some("sk-live".to_string());

        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("sk-live"));
        assert!(debug.contains("openai"));
    }
}
