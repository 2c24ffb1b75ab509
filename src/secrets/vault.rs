use std::sync::Arc;

use crate::crypto::Cipher;
use crate::error::{Error, Result};
use crate::store::Store;

/// Plaintext view over the encrypted secret rows of a [`Store`].
pub struct SecretStore {
    store: Arc<dyn Store>,
    cipher: Arc<Cipher>,
}

impl SecretStore {
    pub fn new(store: Arc<dyn Store>, cipher: Arc<Cipher>) -> Self {
        Self { store, cipher }
    }

    /// Decrypted value at `path`.
    ///
    /// A row that fails to decrypt is reported as absent and logged; store
    /// errors propagate.
    pub fn get(&self, path: &str) -> Result<Option<String>> {
        let Some(secret) = self.store.get_secret(path)? else {
            return Ok(None);
        };

        match self.cipher.decrypt(&secret.ciphertext) {
            Ok(value) => Ok(Some(value)),
            Err(Error::Decryption) => {
                tracing::warn!(
                    "Secret at {path} could not be decrypted with the active key; treating as absent"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Encrypts and stores `value`, overwriting any existing row at `path`.
    pub fn set(&self, path: &str, value: &str) -> Result<()> {
        let ciphertext = self.cipher.encrypt(value)?;
        self.store.upsert_secret(path, &ciphertext)?;
        tracing::info!("Stored secret at {path}");
        Ok(())
    }

    /// Removes the row at `path`. Returns whether one existed; a missing row
    /// is not an error.
    pub fn delete(&self, path: &str) -> Result<bool> {
        let removed = self.store.delete_secret(path)?;
        if removed {
            tracing::info!("Deleted secret at {path}");
        }
        Ok(removed)
    }

    /// Whether a row exists at `path`, without decrypting it.
    pub fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.store.get_secret(path)?.is_some())
    }
}
