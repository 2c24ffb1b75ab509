use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Provider name used for models served by organization-registered endpoints.
pub const CUSTOM_PROVIDER: &str = "custom";

/// Built-in providers that carry an API key credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    Google,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Anthropic, Provider::OpenAi, Provider::Google];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
            Provider::Google => "google",
        }
    }

    /// Name of the secret holding this provider's API key within a scope.
    #[must_use]
    pub fn secret_name(self) -> String {
        format!("{}_api_key", self.as_str())
    }

    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "anthropic" => Some(Provider::Anthropic),
            "openai" => Some(Provider::OpenAi),
            "google" => Some(Provider::Google),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Provider::parse(s).ok_or_else(|| {
            let valid: Vec<&str> = Provider::ALL.iter().map(|p| p.as_str()).collect();
            Error::BadRequest(format!(
                "invalid provider '{s}', must be one of: {}",
                valid.join(", ")
            ))
        })
    }
}

/// Scope a credential was found at, most specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialLevel {
    Team,
    Org,
    Environment,
}

impl CredentialLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CredentialLevel::Team => "team",
            CredentialLevel::Org => "org",
            CredentialLevel::Environment => "environment",
        }
    }
}

impl fmt::Display for CredentialLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved credential and where it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub value: String,
    pub level: CredentialLevel,
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("value", &"<redacted>")
            .field("level", &self.level)
            .finish()
    }
}

/// Diagnostic view of where a provider's key is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub provider: Provider,
    pub configured: bool,
    pub level: Option<CredentialLevel>,
    pub has_team_override: bool,
    pub has_org_key: bool,
    pub has_env_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_roundtrip() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
    }

    #[test]
    fn test_provider_parse_rejects_unknown() {
        assert!(matches!(
            "custom".parse::<Provider>(),
            Err(Error::BadRequest(_))
        ));
        assert!(Provider::parse("Anthropic").is_none());
    }

    #[test]
    fn test_secret_name() {
        assert_eq!(Provider::OpenAi.secret_name(), "openai_api_key");
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&Provider::OpenAi).unwrap(),
            "\"openai\""
        );
        assert_eq!(
            serde_json::to_string(&CredentialLevel::Environment).unwrap(),
            "\"environment\""
        );
    }
}
