use crate::error::{Error, Result};
use crate::types::{OrganizationSettings, Patch, TeamSettings, UserSettings};

pub const MAX_TEMPERATURE: f64 = 2.0;
pub const MAX_TOKENS_LIMIT: u32 = 1_000_000;
pub const MAX_DISPLAY_NAME_LEN: usize = 100;

/// Partial update of an organization's settings. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganizationSettingsUpdate {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub model_display_name: Patch<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Patch<u32>,
    pub top_p: Option<f64>,
    pub fallback_enabled: Option<bool>,
    pub fallback_models: Option<Vec<String>>,
    pub allow_team_customization: Option<bool>,
    pub allow_user_customization: Option<bool>,
    pub allow_per_request_selection: Option<bool>,
    pub enabled_providers: Option<Vec<String>>,
    pub disabled_models: Option<Vec<String>>,
}

/// Partial update of a team's overrides. `Patch::Clear` returns a field to
/// inheriting from the organization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamSettingsUpdate {
    pub provider: Patch<String>,
    pub model: Patch<String>,
    pub temperature: Patch<f64>,
    pub max_tokens: Patch<u32>,
    pub allow_user_customization: Option<bool>,
    pub disabled_models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserSettingsUpdate {
    pub preferred_provider: Patch<String>,
    pub preferred_model: Patch<String>,
    pub preferred_temperature: Patch<f64>,
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn validate_names(field: &str, values: &[String]) -> Result<()> {
    values.iter().try_for_each(|v| validate_name(field, v))
}

fn validate_temperature(value: f64) -> Result<()> {
    if !(0.0..=MAX_TEMPERATURE).contains(&value) {
        return Err(Error::BadRequest(format!(
            "temperature must be between 0 and {MAX_TEMPERATURE}"
        )));
    }
    Ok(())
}

fn validate_top_p(value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::BadRequest("top_p must be between 0 and 1".to_string()));
    }
    Ok(())
}

fn validate_max_tokens(value: u32) -> Result<()> {
    if !(1..=MAX_TOKENS_LIMIT).contains(&value) {
        return Err(Error::BadRequest(format!(
            "max_tokens must be between 1 and {MAX_TOKENS_LIMIT}"
        )));
    }
    Ok(())
}

impl OrganizationSettingsUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(provider) = &self.provider {
            validate_name("provider", provider)?;
        }
        if let Some(model) = &self.model {
            validate_name("model", model)?;
        }
        let display_name_len = self.model_display_name.as_set().map(|n| n.chars().count());
        if display_name_len.is_some_and(|len| len > MAX_DISPLAY_NAME_LEN) {
            return Err(Error::BadRequest(format!(
                "model display name cannot exceed {MAX_DISPLAY_NAME_LEN} characters"
            )));
        }
        if let Some(temperature) = self.temperature {
            validate_temperature(temperature)?;
        }
        if let Some(max_tokens) = self.max_tokens.as_set() {
            validate_max_tokens(*max_tokens)?;
        }
        if let Some(top_p) = self.top_p {
            validate_top_p(top_p)?;
        }
        if let Some(models) = &self.fallback_models {
            validate_names("fallback model", models)?;
        }
        if let Some(providers) = &self.enabled_providers {
            validate_names("enabled provider", providers)?;
        }
        if let Some(models) = &self.disabled_models {
            validate_names("disabled model", models)?;
        }
        Ok(())
    }

    /// Applies the update to `settings`. Returns whether anything changed.
    pub(crate) fn apply(self, settings: &mut OrganizationSettings) -> bool {
        let mut changed = false;

        fn set<T>(target: &mut T, value: Option<T>, changed: &mut bool) {
            if let Some(value) = value {
                *target = value;
                *changed = true;
            }
        }

        set(&mut settings.provider, self.provider, &mut changed);
        set(&mut settings.model, self.model, &mut changed);
        changed |= self.model_display_name.apply(&mut settings.model_display_name);
        set(&mut settings.temperature, self.temperature, &mut changed);
        changed |= self.max_tokens.apply(&mut settings.max_tokens);
        set(&mut settings.top_p, self.top_p, &mut changed);
        set(&mut settings.fallback_enabled, self.fallback_enabled, &mut changed);
        set(&mut settings.fallback_models, self.fallback_models, &mut changed);
        set(
            &mut settings.allow_team_customization,
            self.allow_team_customization,
            &mut changed,
        );
        set(
            &mut settings.allow_user_customization,
            self.allow_user_customization,
            &mut changed,
        );
        set(
            &mut settings.allow_per_request_selection,
            self.allow_per_request_selection,
            &mut changed,
        );
        set(&mut settings.enabled_providers, self.enabled_providers, &mut changed);
        set(&mut settings.disabled_models, self.disabled_models, &mut changed);

        changed
    }
}

impl TeamSettingsUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(provider) = self.provider.as_set() {
            validate_name("provider", provider)?;
        }
        if let Some(model) = self.model.as_set() {
            validate_name("model", model)?;
        }
        if let Some(temperature) = self.temperature.as_set() {
            validate_temperature(*temperature)?;
        }
        if let Some(max_tokens) = self.max_tokens.as_set() {
            validate_max_tokens(*max_tokens)?;
        }
        if let Some(models) = &self.disabled_models {
            validate_names("disabled model", models)?;
        }
        Ok(())
    }

    pub(crate) fn apply(self, settings: &mut TeamSettings) -> bool {
        let mut changed = false;
        changed |= self.provider.apply(&mut settings.provider);
        changed |= self.model.apply(&mut settings.model);
        changed |= self.temperature.apply(&mut settings.temperature);
        changed |= self.max_tokens.apply(&mut settings.max_tokens);
        if let Some(allow) = self.allow_user_customization {
            settings.allow_user_customization = allow;
            changed = true;
        }
        if let Some(models) = self.disabled_models {
            settings.disabled_models = models;
            changed = true;
        }
        changed
    }
}

impl UserSettingsUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(provider) = self.preferred_provider.as_set() {
            validate_name("provider", provider)?;
        }
        if let Some(model) = self.preferred_model.as_set() {
            validate_name("model", model)?;
        }
        if let Some(temperature) = self.preferred_temperature.as_set() {
            validate_temperature(*temperature)?;
        }
        Ok(())
    }

    pub(crate) fn apply(self, settings: &mut UserSettings) -> bool {
        let mut changed = false;
        changed |= self.preferred_provider.apply(&mut settings.preferred_provider);
        changed |= self.preferred_model.apply(&mut settings.preferred_model);
        changed |= self
            .preferred_temperature
            .apply(&mut settings.preferred_temperature);
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_org_update_ranges() {
        let update = OrganizationSettingsUpdate {
            temperature: Some(2.5),
            ..Default::default()
        };
        assert!(matches!(update.validate(), Err(Error::BadRequest(_))));

        let update = OrganizationSettingsUpdate {
            top_p: Some(-0.1),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = OrganizationSettingsUpdate {
            max_tokens: Patch::Set(0),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = OrganizationSettingsUpdate {
            temperature: Some(2.0),
            top_p: Some(0.0),
            max_tokens: Patch::Set(1_000_000),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_org_update_display_name_length() {
        let update = OrganizationSettingsUpdate {
            model_display_name: Patch::Set("x".repeat(101)),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_org_update_rejects_blank_names() {
        let update = OrganizationSettingsUpdate {
            model: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = OrganizationSettingsUpdate {
            enabled_providers: Some(vec!["openai".to_string(), String::new()]),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_org_apply_only_touches_given_fields() {
        let mut settings = OrganizationSettings::with_defaults("org-1");
        let before = settings.clone();

        assert!(!OrganizationSettingsUpdate::default().apply(&mut settings));
        assert_eq!(settings, before);

        let changed = OrganizationSettingsUpdate {
            model: Some("gpt-4o".to_string()),
            max_tokens: Patch::Set(4096),
            ..Default::default()
        }
        .apply(&mut settings);
        assert!(changed);
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.max_tokens, Some(4096));
        assert_eq!(settings.provider, before.provider);
        assert_eq!(settings.temperature, before.temperature);
    }

    #[test]
    fn test_team_apply_clear_returns_to_inherit() {
        let mut settings = TeamSettings::with_defaults("team-1");
        settings.model = Some("gpt-4o".to_string());
        settings.temperature = Some(0.2);

        TeamSettingsUpdate {
            model: Patch::Clear,
            ..Default::default()
        }
        .apply(&mut settings);

        assert!(settings.model.is_none());
        assert_eq!(settings.temperature, Some(0.2));
    }

    #[test]
    fn test_user_update_validation() {
        let update = UserSettingsUpdate {
            preferred_temperature: Patch::Set(-1.0),
            ..Default::default()
        };
        assert!(update.validate().is_err());

        let update = UserSettingsUpdate {
            preferred_temperature: Patch::Clear,
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }
}
