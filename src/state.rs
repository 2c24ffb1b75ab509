use std::fs;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::crypto::Cipher;
use crate::error::Result;
use crate::secrets::{CredentialResolver, SecretCache, SecretStore};
use crate::settings::SettingsHierarchy;
use crate::store::{SqliteStore, Store};

/// The service graph, built once at startup and shared by reference.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub cipher: Arc<Cipher>,
    pub secrets: Arc<SecretStore>,
    pub cache: Arc<SecretCache>,
    pub credentials: Arc<CredentialResolver>,
    pub settings: Arc<SettingsHierarchy>,
}

impl AppState {
    /// Wires the services over an initialized `store`.
    ///
    /// Fails with a configuration error when no master secret is set.
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self> {
        Self::with_catalog(config, store, Catalog::builtin())
    }

    pub fn with_catalog(config: AppConfig, store: Arc<dyn Store>, catalog: Catalog) -> Result<Self> {
        let cipher = Arc::new(Cipher::new(config.require_master_secret()?)?);
        let secrets = Arc::new(SecretStore::new(store.clone(), cipher.clone()));
        let cache = Arc::new(SecretCache::new(secrets.clone(), config.cache_ttl));
        let credentials = Arc::new(CredentialResolver::new(
            cache.clone(),
            config.provider_keys.clone(),
        ));
        let settings = Arc::new(SettingsHierarchy::new(
            store.clone(),
            credentials.clone(),
            catalog,
        ));

        Ok(Self {
            config,
            store,
            cipher,
            secrets,
            cache,
            credentials,
            settings,
        })
    }

    /// Opens (creating if needed) the SQLite database under the configured
    /// data directory and wires the services over it.
    pub fn open(config: AppConfig) -> Result<Self> {
        config.require_master_secret()?;
        fs::create_dir_all(&config.data_dir)?;

        let store = SqliteStore::new(config.db_path())?;
        store.initialize()?;
        Self::new(config, Arc::new(store))
    }

    /// Drops cached secrets and closes the store.
    pub fn shutdown(&self) -> Result<()> {
        self.cache.clear();
        self.store.close()
    }
}
