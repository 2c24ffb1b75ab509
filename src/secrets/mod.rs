//! Encrypted, path-addressed secrets and the credential fallback chain built
//! on top of them.

mod cache;
mod credentials;
mod vault;

pub use cache::SecretCache;
pub use credentials::CredentialResolver;
pub use vault::SecretStore;
