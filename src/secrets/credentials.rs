use std::sync::Arc;

use super::SecretCache;
use crate::config::ProviderKeys;
use crate::error::{Error, Result};
use crate::store::path::SecretPath;
use crate::types::{CredentialLevel, CredentialStatus, Provider, ResolvedCredential};

const CUSTOM_PROVIDER_KEY_NAME: &str = "api_key";

/// Resolves provider credentials along team → organization → environment.
pub struct CredentialResolver {
    cache: Arc<SecretCache>,
    env_keys: ProviderKeys,
}

impl CredentialResolver {
    pub fn new(cache: Arc<SecretCache>, env_keys: ProviderKeys) -> Self {
        Self { cache, env_keys }
    }

    #[must_use]
    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }

    fn credential_path(provider: Provider, org_id: &str, team_id: Option<&str>) -> Result<String> {
        SecretPath::scope(org_id, team_id)?.secret(&provider.secret_name())
    }

    /// Non-empty value at `path`.
    fn lookup(&self, path: &str) -> Result<Option<String>> {
        Ok(self.cache.get(path)?.filter(|v| !v.is_empty()))
    }

    pub fn resolve_credential(
        &self,
        provider: Provider,
        org_id: &str,
        team_id: Option<&str>,
    ) -> Result<Option<String>> {
        Ok(self
            .resolve_credential_with_level(provider, org_id, team_id)?
            .map(|resolved| resolved.value))
    }

    /// First credential found, most specific scope first.
    pub fn resolve_credential_with_level(
        &self,
        provider: Provider,
        org_id: &str,
        team_id: Option<&str>,
    ) -> Result<Option<ResolvedCredential>> {
        if let Some(team_id) = team_id {
            let path = Self::credential_path(provider, org_id, Some(team_id))?;
            if let Some(value) = self.lookup(&path)? {
                tracing::debug!("Resolved {provider} credential at team level for {team_id}");
                return Ok(Some(ResolvedCredential {
                    value,
                    level: CredentialLevel::Team,
                }));
            }
        }

        let path = Self::credential_path(provider, org_id, None)?;
        if let Some(value) = self.lookup(&path)? {
            tracing::debug!("Resolved {provider} credential at org level for {org_id}");
            return Ok(Some(ResolvedCredential {
                value,
                level: CredentialLevel::Org,
            }));
        }

        if let Some(value) = self.env_keys.get(provider) {
            tracing::debug!("Resolved {provider} credential from environment default");
            return Ok(Some(ResolvedCredential {
                value: value.to_string(),
                level: CredentialLevel::Environment,
            }));
        }

        tracing::debug!("No {provider} credential configured for {org_id}");
        Ok(None)
    }

    /// Stores a credential at the most specific scope given.
    pub fn set_credential(
        &self,
        provider: Provider,
        value: &str,
        org_id: &str,
        team_id: Option<&str>,
    ) -> Result<()> {
        if value.is_empty() {
            return Err(Error::BadRequest("credential value cannot be empty".to_string()));
        }
        let path = Self::credential_path(provider, org_id, team_id)?;
        self.cache.set(&path, value)
    }

    pub fn delete_credential(
        &self,
        provider: Provider,
        org_id: &str,
        team_id: Option<&str>,
    ) -> Result<bool> {
        let path = Self::credential_path(provider, org_id, team_id)?;
        self.cache.delete(&path)
    }

    /// Where `provider`'s key is configured, from three independent checks.
    pub fn credential_status(
        &self,
        provider: Provider,
        org_id: &str,
        team_id: Option<&str>,
    ) -> Result<CredentialStatus> {
        let has_team_override = match team_id {
            Some(team_id) => {
                let path = Self::credential_path(provider, org_id, Some(team_id))?;
                self.lookup(&path)?.is_some()
            }
            None => false,
        };
        let has_org_key = self
            .lookup(&Self::credential_path(provider, org_id, None)?)?
            .is_some();
        let has_env_fallback = self.env_keys.get(provider).is_some();

        let level = if has_team_override {
            Some(CredentialLevel::Team)
        } else if has_org_key {
            Some(CredentialLevel::Org)
        } else if has_env_fallback {
            Some(CredentialLevel::Environment)
        } else {
            None
        };

        Ok(CredentialStatus {
            provider,
            configured: level.is_some(),
            level,
            has_team_override,
            has_org_key,
            has_env_fallback,
        })
    }

    pub fn list_credential_status(
        &self,
        org_id: &str,
        team_id: Option<&str>,
    ) -> Result<Vec<CredentialStatus>> {
        Provider::ALL
            .iter()
            .map(|provider| self.credential_status(*provider, org_id, team_id))
            .collect()
    }

    // MCP server secrets

    fn mcp_path(
        server_id: &str,
        org_id: &str,
        team_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String> {
        let mut scope = SecretPath::scope(org_id, team_id)?;
        // User scoping only exists beneath a team.
        if let (Some(_), Some(user_id)) = (team_id, user_id) {
            scope = scope.user(user_id)?;
        }
        scope.mcp()?.secret(&mcp_secret_name(server_id))
    }

    /// Stores an MCP server's auth secret and returns the reference name.
    pub fn set_mcp_secret(
        &self,
        server_id: &str,
        value: &str,
        org_id: &str,
        team_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<String> {
        let path = Self::mcp_path(server_id, org_id, team_id, user_id)?;
        self.cache.set(&path, value)?;
        Ok(mcp_secret_name(server_id))
    }

    pub fn get_mcp_secret(
        &self,
        server_id: &str,
        org_id: &str,
        team_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<Option<String>> {
        let path = Self::mcp_path(server_id, org_id, team_id, user_id)?;
        self.lookup(&path)
    }

    pub fn delete_mcp_secret(
        &self,
        server_id: &str,
        org_id: &str,
        team_id: Option<&str>,
        user_id: Option<&str>,
    ) -> Result<bool> {
        let path = Self::mcp_path(server_id, org_id, team_id, user_id)?;
        self.cache.delete(&path)
    }

    // Custom provider keys

    fn custom_provider_key_path(provider_id: &str, org_id: &str) -> Result<String> {
        SecretPath::organization(org_id)?
            .custom_provider(provider_id)?
            .secret(CUSTOM_PROVIDER_KEY_NAME)
    }

    pub fn set_custom_provider_key(&self, provider_id: &str, value: &str, org_id: &str) -> Result<()> {
        if value.is_empty() {
            return Err(Error::BadRequest("API key cannot be empty".to_string()));
        }
        let path = Self::custom_provider_key_path(provider_id, org_id)?;
        self.cache.set(&path, value)
    }

    pub fn get_custom_provider_key(&self, provider_id: &str, org_id: &str) -> Result<Option<String>> {
        let path = Self::custom_provider_key_path(provider_id, org_id)?;
        self.lookup(&path)
    }

    pub fn delete_custom_provider_key(&self, provider_id: &str, org_id: &str) -> Result<bool> {
        let path = Self::custom_provider_key_path(provider_id, org_id)?;
        self.cache.delete(&path)
    }

    pub fn has_custom_provider_key(&self, provider_id: &str, org_id: &str) -> Result<bool> {
        Ok(self.get_custom_provider_key(provider_id, org_id)?.is_some())
    }
}

fn mcp_secret_name(server_id: &str) -> String {
    format!("mcp_server_{server_id}")
}
