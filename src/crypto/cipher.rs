use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use rand::Rng;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Fixed derivation salt. The master secret supplies the entropy; changing it
/// makes every stored value undecryptable.
const DERIVATION_SALT: &[u8] = b"modelgate-secrets-v1";
const KEY_DERIVATION_ITERATIONS: u32 = 100_000;
const KEY_LEN: usize = 32;

const TOKEN_VERSION: u8 = 0x01;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const MIN_TOKEN_LEN: usize = 1 + NONCE_LEN + TAG_LEN;

/// Authenticated encryption of secret strings with a key derived from the
/// process master secret.
///
/// The key is derived once in [`Cipher::new`]; construct one instance at
/// startup and share it.
pub struct Cipher {
    aead: Aes256Gcm,
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cipher").finish_non_exhaustive()
    }
}

impl Cipher {
    pub fn new(master_secret: &str) -> Result<Self> {
        if master_secret.is_empty() {
            return Err(Error::Config(
                "master secret must be set to use encrypted secret storage".to_string(),
            ));
        }

        let key = derive_key(master_secret);
        let aead = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| Error::Config(format!("invalid derived key: {e}")))?;

        tracing::info!("Secret cipher initialized");
        Ok(Self { aead })
    }

    /// Encrypts `plaintext` into a URL-safe token: version || nonce || ciphertext+tag.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .aead
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::Crypto(e.to_string()))?;

        let mut out = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        out.push(TOKEN_VERSION);
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(URL_SAFE.encode(out))
    }

    /// Decrypts a token produced by [`Cipher::encrypt`].
    ///
    /// Any malformed, tampered, or foreign-key token yields [`Error::Decryption`].
    pub fn decrypt(&self, token: &str) -> Result<String> {
        let raw = URL_SAFE
            .decode(token.trim())
            .map_err(|_| Error::Decryption)?;

        if raw.len() < MIN_TOKEN_LEN || raw[0] != TOKEN_VERSION {
            return Err(Error::Decryption);
        }

        let nonce = Nonce::from_slice(&raw[1..1 + NONCE_LEN]);
        let body = &raw[1 + NONCE_LEN..];

        let plaintext = self
            .aead
            .decrypt(nonce, body)
            .map_err(|_| Error::Decryption)?;

        String::from_utf8(plaintext).map_err(|_| Error::Decryption)
    }
}

/// PBKDF2-HMAC-SHA256 over the master secret with the fixed salt.
#[must_use]
pub fn derive_key(master_secret: &str) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(
        master_secret.as_bytes(),
        DERIVATION_SALT,
        KEY_DERIVATION_ITERATIONS,
        &mut key[..],
    );
    key
}
