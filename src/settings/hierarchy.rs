use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use super::{OrganizationSettingsUpdate, TeamSettingsUpdate, UserSettingsUpdate};
use crate::catalog::{Catalog, ModelInfo};
use crate::error::{Error, Result};
use crate::secrets::CredentialResolver;
use crate::store::Store;
use crate::types::*;

/// Settings rows plus the override walk that turns them into
/// [`EffectiveSettings`].
pub struct SettingsHierarchy {
    store: Arc<dyn Store>,
    credentials: Arc<CredentialResolver>,
    catalog: Catalog,
}

/// Applies the organization → team → user override rules.
///
/// Team values apply only when the organization allows team customization,
/// and user values only when both the organization and (if present) the team
/// allow user customization. `available_models` and `available_providers`
/// are left for the caller to fill.
#[must_use]
pub fn merge_settings(
    org: &OrganizationSettings,
    team: Option<&TeamSettings>,
    user: &UserSettings,
) -> EffectiveSettings {
    let mut provider = org.provider.clone();
    let mut model = org.model.clone();
    let mut temperature = org.temperature;
    let mut max_tokens = org.max_tokens;
    let mut settings_source = SettingsSource::Org;

    if let Some(team) = team.filter(|_| org.allow_team_customization) {
        if let Some(value) = &team.provider {
            provider = value.clone();
            settings_source = SettingsSource::Team;
        }
        if let Some(value) = &team.model {
            model = value.clone();
            settings_source = SettingsSource::Team;
        }
        if let Some(value) = team.temperature {
            temperature = value;
        }
        if let Some(value) = team.max_tokens {
            max_tokens = Some(value);
        }
    }

    // The team's flag counts even when its values were vetoed above.
    let user_can_customize =
        org.allow_user_customization && team.is_none_or(|t| t.allow_user_customization);

    if user_can_customize {
        if let Some(value) = &user.preferred_provider {
            provider = value.clone();
            settings_source = SettingsSource::User;
        }
        if let Some(value) = &user.preferred_model {
            model = value.clone();
            settings_source = SettingsSource::User;
        }
        if let Some(value) = user.preferred_temperature {
            temperature = value;
        }
    }

    EffectiveSettings {
        provider,
        model,
        temperature,
        max_tokens,
        top_p: org.top_p,
        fallback_enabled: org.fallback_enabled,
        fallback_models: org.fallback_models.clone(),
        available_providers: org.enabled_providers.clone(),
        available_models: Vec::new(),
        can_change_model: user_can_customize,
        can_change_parameters: user_can_customize,
        per_request_selection_allowed: org.allow_per_request_selection,
        settings_source,
    }
}

fn disabled_models(org: &OrganizationSettings, team: Option<&TeamSettings>) -> HashSet<String> {
    org.disabled_models
        .iter()
        .chain(team.map(|t| t.disabled_models.iter()).into_iter().flatten())
        .cloned()
        .collect()
}

impl SettingsHierarchy {
    pub fn new(store: Arc<dyn Store>, credentials: Arc<CredentialResolver>, catalog: Catalog) -> Self {
        Self {
            store,
            credentials,
            catalog,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(super) fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub(super) fn credentials(&self) -> &CredentialResolver {
        &self.credentials
    }

    // Row lifecycle

    /// Returns the organization's settings, creating the default row first
    /// if there is none.
    pub fn ensure_org_settings(&self, organization_id: &str) -> Result<OrganizationSettings> {
        self.store
            .ensure_org_settings(&OrganizationSettings::with_defaults(organization_id))
    }

    pub fn ensure_team_settings(&self, team_id: &str) -> Result<TeamSettings> {
        self.store
            .ensure_team_settings(&TeamSettings::with_defaults(team_id))
    }

    pub fn ensure_user_settings(&self, user_id: &str) -> Result<UserSettings> {
        self.store
            .ensure_user_settings(&UserSettings::with_defaults(user_id))
    }

    pub fn update_org_settings(
        &self,
        organization_id: &str,
        update: OrganizationSettingsUpdate,
    ) -> Result<OrganizationSettings> {
        update.validate()?;
        let mut update = Some(update);
        let mut changed = false;
        let settings = self.store.modify_org_settings(
            &OrganizationSettings::with_defaults(organization_id),
            &mut |settings| {
                changed = update.take().is_some_and(|u| u.apply(settings));
                if changed {
                    settings.updated_at = Utc::now();
                }
                changed
            },
        )?;
        if changed {
            tracing::info!("Updated LLM settings for organization {organization_id}");
        }
        Ok(settings)
    }

    /// Updates a team's overrides. Fails with
    /// [`Error::CustomizationDisabled`] while the organization does not allow
    /// team customization.
    pub fn update_team_settings(
        &self,
        organization_id: &str,
        team_id: &str,
        update: TeamSettingsUpdate,
    ) -> Result<TeamSettings> {
        let org = self.ensure_org_settings(organization_id)?;
        if !org.allow_team_customization {
            return Err(Error::CustomizationDisabled(
                "organization does not allow team customization".to_string(),
            ));
        }

        update.validate()?;
        let mut update = Some(update);
        let mut changed = false;
        let settings = self.store.modify_team_settings(
            &TeamSettings::with_defaults(team_id),
            &mut |settings| {
                changed = update.take().is_some_and(|u| u.apply(settings));
                if changed {
                    settings.updated_at = Utc::now();
                }
                changed
            },
        )?;
        if changed {
            tracing::info!("Updated LLM settings for team {team_id}");
        }
        Ok(settings)
    }

    pub fn update_user_settings(
        &self,
        user_id: &str,
        update: UserSettingsUpdate,
    ) -> Result<UserSettings> {
        update.validate()?;
        let mut update = Some(update);
        let mut changed = false;
        let settings = self.store.modify_user_settings(
            &UserSettings::with_defaults(user_id),
            &mut |settings| {
                changed = update.take().is_some_and(|u| u.apply(settings));
                if changed {
                    settings.updated_at = Utc::now();
                }
                changed
            },
        )?;
        if changed {
            tracing::info!("Updated LLM preferences for user {user_id}");
        }
        Ok(settings)
    }

    // Resolution

    /// Built-in models of the enabled providers plus in-scope custom models,
    /// minus the organization's and team's disabled models.
    pub fn available_models(
        &self,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<Vec<ModelInfo>> {
        let org = self.ensure_org_settings(organization_id)?;
        let team = team_id.map(|id| self.ensure_team_settings(id)).transpose()?;
        let custom = self.store.list_custom_providers(organization_id, team_id)?;

        Ok(self.catalog.available_models(
            &org.enabled_providers,
            &custom,
            &disabled_models(&org, team.as_ref()),
        ))
    }

    pub fn compute_effective(
        &self,
        user_id: &str,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<EffectiveSettings> {
        let org = self.ensure_org_settings(organization_id)?;
        let team = team_id.map(|id| self.ensure_team_settings(id)).transpose()?;
        let user = self.ensure_user_settings(user_id)?;
        let custom = self.store.list_custom_providers(organization_id, team_id)?;

        let mut effective = merge_settings(&org, team.as_ref(), &user);
        effective.available_models = self.catalog.available_models(
            &org.enabled_providers,
            &custom,
            &disabled_models(&org, team.as_ref()),
        );
        if !custom.is_empty()
            && !effective
                .available_providers
                .iter()
                .any(|p| p == CUSTOM_PROVIDER)
        {
            effective.available_providers.push(CUSTOM_PROVIDER.to_string());
        }

        Ok(effective)
    }

    /// The provider, model and parameters for one model invocation.
    ///
    /// Without a user, the organization's defaults. With one, the effective
    /// settings, then `overrides` when per-request selection is allowed.
    pub fn select_for_request(
        &self,
        organization_id: &str,
        team_id: Option<&str>,
        user_id: Option<&str>,
        overrides: RequestOverrides,
    ) -> Result<ModelSelection> {
        let Some(user_id) = user_id else {
            let org = self.ensure_org_settings(organization_id)?;
            return Ok(ModelSelection {
                provider: org.provider,
                model: org.model,
                temperature: org.temperature,
                max_tokens: org.max_tokens,
            });
        };

        let effective = self.compute_effective(user_id, organization_id, team_id)?;
        let mut selection = ModelSelection {
            provider: effective.provider,
            model: effective.model,
            temperature: effective.temperature,
            max_tokens: effective.max_tokens,
        };

        if effective.per_request_selection_allowed {
            if let Some(provider) = overrides.provider {
                selection.provider = provider;
            }
            if let Some(model) = overrides.model {
                selection.model = model;
            }
            if let Some(temperature) = overrides.temperature {
                selection.temperature = temperature;
            }
        }

        Ok(selection)
    }

    /// Credential for calling `model` on `provider` in the given scope.
    ///
    /// Built-in providers use the team → org → environment chain. For
    /// `custom`, the key of the first in-scope custom provider serving the
    /// model; there is no environment fallback.
    pub fn resolve_for_model(
        &self,
        provider: &str,
        model: &str,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<Option<String>> {
        if let Some(provider) = Provider::parse(provider) {
            return self
                .credentials
                .resolve_credential(provider, organization_id, team_id);
        }

        if provider != CUSTOM_PROVIDER {
            tracing::debug!("No credential source for unknown provider {provider}");
            return Ok(None);
        }

        for custom in self.store.list_custom_providers(organization_id, team_id)? {
            if custom.serves_model(model) {
                return self
                    .credentials
                    .get_custom_provider_key(&custom.id, organization_id);
            }
        }

        Ok(None)
    }

    /// Effective settings together with the credential for the resolved
    /// provider.
    pub fn resolve(
        &self,
        user_id: &str,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<Resolution> {
        let settings = self.compute_effective(user_id, organization_id, team_id)?;
        let credential =
            self.resolve_for_model(&settings.provider, &settings.model, organization_id, team_id)?;
        Ok(Resolution {
            settings,
            credential,
        })
    }
}
