use chrono::Utc;

use super::SettingsHierarchy;
use crate::catalog::CustomModel;
use crate::error::{Error, Result};
use crate::types::{CustomProvider, Patch};

pub const MAX_PROVIDER_NAME_LEN: usize = 100;
pub const MAX_BASE_URL_LEN: usize = 500;
pub const DEFAULT_PROVIDER_TYPE: &str = "openai_compatible";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCustomProvider {
    pub name: String,
    pub base_url: String,
    pub available_models: Vec<CustomModel>,
    /// Restricts the provider to one team; `None` makes it organization-wide.
    pub team_id: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomProviderUpdate {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub available_models: Option<Vec<CustomModel>>,
    pub is_enabled: Option<bool>,
    /// `Set` stores a new key, `Clear` deletes the stored one.
    pub api_key: Patch<String>,
}

fn validate_provider_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest("provider name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_PROVIDER_NAME_LEN {
        return Err(Error::BadRequest(format!(
            "provider name cannot exceed {MAX_PROVIDER_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_base_url(url: &str) -> Result<()> {
    if url.len() > MAX_BASE_URL_LEN {
        return Err(Error::BadRequest(format!(
            "base URL cannot exceed {MAX_BASE_URL_LEN} characters"
        )));
    }
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(Error::BadRequest(
            "base URL must start with http:// or https://".to_string(),
        )),
    }
}

impl SettingsHierarchy {
    pub fn create_custom_provider(
        &self,
        organization_id: &str,
        new: NewCustomProvider,
    ) -> Result<CustomProvider> {
        validate_provider_name(&new.name)?;
        validate_base_url(&new.base_url)?;

        let now = Utc::now();
        let provider = CustomProvider {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            team_id: new.team_id,
            name: new.name,
            provider_type: DEFAULT_PROVIDER_TYPE.to_string(),
            base_url: new.base_url,
            available_models: new.available_models,
            is_enabled: true,
            created_at: now,
            updated_at: now,
        };

        let api_key = new.api_key.filter(|k| !k.is_empty());
        if let Some(api_key) = &api_key {
            self.credentials()
                .set_custom_provider_key(&provider.id, api_key, organization_id)?;
        }
        if let Err(e) = self.store().create_custom_provider(&provider) {
            if api_key.is_some() {
                if let Err(cleanup) = self
                    .credentials()
                    .delete_custom_provider_key(&provider.id, organization_id)
                {
                    tracing::warn!(
                        "Failed to remove key of unsaved custom provider {}: {cleanup}",
                        provider.id
                    );
                }
            }
            return Err(e);
        }

        tracing::info!(
            "Created custom provider {} ({}) for organization {organization_id}",
            provider.name,
            provider.id
        );
        Ok(provider)
    }

    /// Looks up a custom provider, optionally requiring it to belong to
    /// `organization_id`.
    pub fn get_custom_provider(
        &self,
        id: &str,
        organization_id: Option<&str>,
    ) -> Result<Option<CustomProvider>> {
        let provider = self.store().get_custom_provider(id)?;
        Ok(provider.filter(|p| organization_id.is_none_or(|org| p.organization_id == org)))
    }

    /// Enabled custom providers in scope. With a team, the organization-wide
    /// ones plus that team's own; without one, every enabled provider of the
    /// organization.
    pub fn list_custom_providers(
        &self,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<Vec<CustomProvider>> {
        self.store().list_custom_providers(organization_id, team_id)
    }

    /// Applies `update` to a provider of `organization_id`. Providers of other
    /// organizations are [`Error::NotFound`].
    pub fn update_custom_provider(
        &self,
        organization_id: &str,
        id: &str,
        update: CustomProviderUpdate,
    ) -> Result<CustomProvider> {
        if let Some(name) = &update.name {
            validate_provider_name(name)?;
        }
        if let Some(url) = &update.base_url {
            validate_base_url(url)?;
        }
        if update.api_key.as_set().is_some_and(|k| k.is_empty()) {
            return Err(Error::BadRequest("API key cannot be empty".to_string()));
        }

        let mut provider = self
            .get_custom_provider(id, Some(organization_id))?
            .ok_or(Error::NotFound)?;

        if let Some(name) = update.name {
            provider.name = name;
        }
        if let Some(url) = update.base_url {
            provider.base_url = url;
        }
        if let Some(models) = update.available_models {
            provider.available_models = models;
        }
        if let Some(enabled) = update.is_enabled {
            provider.is_enabled = enabled;
        }
        provider.updated_at = Utc::now();
        self.store().update_custom_provider(&provider)?;

        match update.api_key {
            Patch::Keep => {}
            Patch::Set(key) => {
                self.credentials()
                    .set_custom_provider_key(&provider.id, &key, &provider.organization_id)?;
            }
            Patch::Clear => {
                self.credentials()
                    .delete_custom_provider_key(&provider.id, &provider.organization_id)?;
            }
        }

        tracing::info!("Updated custom provider {id}");
        Ok(provider)
    }

    /// Deletes a custom provider and its stored key. Returns false when no
    /// such provider exists in the organization.
    pub fn delete_custom_provider(&self, organization_id: &str, id: &str) -> Result<bool> {
        if self.get_custom_provider(id, Some(organization_id))?.is_none() {
            return Ok(false);
        }

        self.credentials()
            .delete_custom_provider_key(id, organization_id)?;
        let removed = self.store().delete_custom_provider(id)?;
        if removed {
            tracing::info!("Deleted custom provider {id} from organization {organization_id}");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::catalog::Catalog;
    use crate::config::ProviderKeys;
    use crate::crypto::Cipher;
    use crate::secrets::{CredentialResolver, SecretCache, SecretStore};
    use crate::store::{SqliteStore, Store};
    use tempfile::TempDir;

    fn test_hierarchy() -> (TempDir, SettingsHierarchy) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let store: Arc<dyn Store> = Arc::new(store);
        let cipher = Arc::new(Cipher::new("master").unwrap());
        let secrets = Arc::new(SecretStore::new(store.clone(), cipher));
        let cache = Arc::new(SecretCache::new(secrets, Duration::from_secs(300)));
        let credentials = Arc::new(CredentialResolver::new(cache, ProviderKeys::default()));
        (
            temp,
            SettingsHierarchy::new(store, credentials, Catalog::builtin()),
        )
    }

    fn local(api_key: Option<&str>) -> NewCustomProvider {
        NewCustomProvider {
            name: "Local".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            available_models: vec![CustomModel::new("llama3")],
            team_id: None,
            api_key: api_key.map(str::to_string),
        }
    }

    #[test]
    fn test_create_stores_key_separately() {
        let (_temp, hierarchy) = test_hierarchy();
        let provider = hierarchy
            .create_custom_provider("org-1", local(Some("sk-local")))
            .unwrap();

        assert_eq!(provider.provider_type, "openai_compatible");
        assert!(provider.is_enabled);
        assert!(
            hierarchy
                .credentials()
                .has_custom_provider_key(&provider.id, "org-1")
                .unwrap()
        );
    }

    #[test]
    fn test_create_validation() {
        let (_temp, hierarchy) = test_hierarchy();

        let mut bad = local(None);
        bad.base_url = "ftp://example.com".to_string();
        assert!(matches!(
            hierarchy.create_custom_provider("org-1", bad),
            Err(Error::BadRequest(_))
        ));

        let mut bad = local(None);
        bad.name = "n".repeat(101);
        assert!(hierarchy.create_custom_provider("org-1", bad).is_err());

        let mut bad = local(None);
        bad.base_url = format!("https://{}", "a".repeat(500));
        assert!(hierarchy.create_custom_provider("org-1", bad).is_err());

        assert!(hierarchy.list_custom_providers("org-1", None).unwrap().is_empty());
    }

    #[test]
    fn test_get_checks_organization() {
        let (_temp, hierarchy) = test_hierarchy();
        let provider = hierarchy.create_custom_provider("org-1", local(None)).unwrap();

        assert!(
            hierarchy
                .get_custom_provider(&provider.id, Some("org-1"))
                .unwrap()
                .is_some()
        );
        assert!(
            hierarchy
                .get_custom_provider(&provider.id, Some("org-2"))
                .unwrap()
                .is_none()
        );
        assert!(hierarchy.get_custom_provider(&provider.id, None).unwrap().is_some());
    }

    #[test]
    fn test_update_key_patch() {
        let (_temp, hierarchy) = test_hierarchy();
        let provider = hierarchy.create_custom_provider("org-1", local(None)).unwrap();

        hierarchy
            .update_custom_provider(
                "org-1",
                &provider.id,
                CustomProviderUpdate {
                    api_key: Patch::Set("sk-new".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            hierarchy
                .credentials()
                .get_custom_provider_key(&provider.id, "org-1")
                .unwrap()
                .as_deref(),
            Some("sk-new")
        );

        let updated = hierarchy
            .update_custom_provider(
                "org-1",
                &provider.id,
                CustomProviderUpdate {
                    is_enabled: Some(false),
                    api_key: Patch::Clear,
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(!updated.is_enabled);
        assert!(
            !hierarchy
                .credentials()
                .has_custom_provider_key(&provider.id, "org-1")
                .unwrap()
        );
        assert!(hierarchy.list_custom_providers("org-1", None).unwrap().is_empty());
    }

    #[test]
    fn test_update_missing_provider() {
        let (_temp, hierarchy) = test_hierarchy();
        let result =
            hierarchy.update_custom_provider("org-1", "missing", CustomProviderUpdate::default());
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_update_checks_organization() {
        let (_temp, hierarchy) = test_hierarchy();
        let provider = hierarchy
            .create_custom_provider("org-1", local(Some("sk-local")))
            .unwrap();

        let result = hierarchy.update_custom_provider(
            "org-2",
            &provider.id,
            CustomProviderUpdate {
                name: Some("taken".to_string()),
                is_enabled: Some(false),
                api_key: Patch::Clear,
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(Error::NotFound)));

        let unchanged = hierarchy
            .get_custom_provider(&provider.id, Some("org-1"))
            .unwrap()
            .unwrap();
        assert_eq!(unchanged.name, "Local");
        assert!(unchanged.is_enabled);
        assert!(
            hierarchy
                .credentials()
                .has_custom_provider_key(&provider.id, "org-1")
                .unwrap()
        );
    }

    #[test]
    fn test_create_leaves_no_row_when_key_write_fails() {
        let (_temp, hierarchy) = test_hierarchy();

        // A slash cannot appear in a secret path segment.
        let result = hierarchy.create_custom_provider("org/1", local(Some("sk-local")));
        assert!(matches!(result, Err(Error::BadRequest(_))));
        assert!(hierarchy.list_custom_providers("org/1", None).unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_key() {
        let (_temp, hierarchy) = test_hierarchy();
        let provider = hierarchy
            .create_custom_provider("org-1", local(Some("sk-local")))
            .unwrap();

        assert!(!hierarchy.delete_custom_provider("org-2", &provider.id).unwrap());
        assert!(hierarchy.delete_custom_provider("org-1", &provider.id).unwrap());
        assert!(
            !hierarchy
                .credentials()
                .has_custom_provider_key(&provider.id, "org-1")
                .unwrap()
        );
        assert!(!hierarchy.delete_custom_provider("org-1", &provider.id).unwrap());
    }
}
