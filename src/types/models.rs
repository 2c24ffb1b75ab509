use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::CustomModel;

pub const DEFAULT_PROVIDER: &str = "anthropic";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 1.0;

/// One encrypted, path-addressed secret row. `ciphertext` is a cipher token,
/// never plaintext.
#[derive(Clone, Serialize, Deserialize)]
pub struct EncryptedSecret {
    pub id: String,
    pub path: String,
    #[serde(skip_serializing)]
    pub ciphertext: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    pub id: String,
    pub organization_id: String,

    pub provider: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_display_name: Option<String>,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub top_p: f64,

    pub fallback_enabled: bool,
    pub fallback_models: Vec<String>,

    pub allow_team_customization: bool,
    pub allow_user_customization: bool,
    pub allow_per_request_selection: bool,

    pub enabled_providers: Vec<String>,
    pub disabled_models: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrganizationSettings {
    /// The row created on first access to an organization.
    #[must_use]
    pub fn with_defaults(organization_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: organization_id.to_string(),
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_display_name: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            top_p: DEFAULT_TOP_P,
            fallback_enabled: false,
            fallback_models: Vec::new(),
            allow_team_customization: true,
            allow_user_customization: true,
            allow_per_request_selection: true,
            enabled_providers: vec![
                "anthropic".to_string(),
                "openai".to_string(),
                "google".to_string(),
            ],
            disabled_models: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Team overrides. `None` means inherit from the organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSettings {
    pub id: String,
    pub team_id: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub allow_user_customization: bool,
    /// Merged with the organization's list, never subtracted from it.
    pub disabled_models: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamSettings {
    #[must_use]
    pub fn with_defaults(team_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            team_id: team_id.to_string(),
            provider: None,
            model: None,
            temperature: None,
            max_tokens: None,
            allow_user_customization: true,
            disabled_models: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Personal preferences. `None` means inherit from organization/team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub id: String,
    pub user_id: String,
    pub preferred_provider: Option<String>,
    pub preferred_model: Option<String>,
    pub preferred_temperature: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    #[must_use]
    pub fn with_defaults(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            preferred_provider: None,
            preferred_model: None,
            preferred_temperature: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An OpenAI-compatible endpoint registered by an organization, optionally
/// scoped to one team. Its API key lives in the secret store, never here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomProvider {
    pub id: String,
    pub organization_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    pub name: String,
    pub provider_type: String,
    pub base_url: String,
    pub available_models: Vec<CustomModel>,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomProvider {
    #[must_use]
    pub fn serves_model(&self, model_id: &str) -> bool {
        self.available_models.iter().any(|m| m.id == model_id)
    }
}
