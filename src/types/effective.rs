use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::ModelInfo;

/// Most specific hierarchy level that set the provider or model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsSource {
    Org,
    Team,
    User,
}

impl SettingsSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SettingsSource::Org => "org",
            SettingsSource::Team => "team",
            SettingsSource::User => "user",
        }
    }
}

impl fmt::Display for SettingsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings after walking organization → team → user. Computed per request,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub top_p: f64,

    pub fallback_enabled: bool,
    pub fallback_models: Vec<String>,

    pub available_providers: Vec<String>,
    pub available_models: Vec<ModelInfo>,

    pub can_change_model: bool,
    pub can_change_parameters: bool,
    pub per_request_selection_allowed: bool,

    pub settings_source: SettingsSource,
}

/// Per-request selection asked for by a caller. Honored only when the
/// organization allows per-request selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
}

/// What a single model invocation should use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSelection {
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
}

/// Effective settings together with the credential for the resolved provider.
#[derive(Clone, PartialEq)]
pub struct Resolution {
    pub settings: EffectiveSettings,
    pub credential: Option<String>,
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("settings", &self.settings)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
