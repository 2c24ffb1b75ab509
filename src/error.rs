use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Ciphertext did not verify against the active key. Carries no key or
    /// ciphertext material.
    #[error("secret could not be decrypted")]
    Decryption,

    #[error("encryption failed: {0}")]
    Crypto(String),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("customization disabled: {0}")]
    CustomizationDisabled(String),
}

pub type Result<T> = std::result::Result<T, Error>;
