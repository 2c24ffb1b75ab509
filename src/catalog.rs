//! Selectable models per provider.
//!
//! Built-in providers ship a fixed list; organizations add their own through
//! custom providers. [`Catalog::available_models`] merges both and applies the
//! disabled-model restrictions.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::types::{CUSTOM_PROVIDER, CustomProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCapability {
    ToolCalling,
    Vision,
    Streaming,
    StructuredOutput,
    Reasoning,
    LongContext,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub capabilities: Vec<ModelCapability>,
    pub max_context_tokens: Option<u32>,
    pub max_output_tokens: Option<u32>,
}

/// A model entry on a custom provider, stored as JSON on the provider row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomModel {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl CustomModel {
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            capabilities: Vec::new(),
            max_context_tokens: None,
            max_output_tokens: None,
        }
    }
}

/// A model as offered to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub capabilities: Vec<String>,
    pub max_context_tokens: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub is_custom: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_provider_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    builtin: BTreeMap<String, Vec<ModelDescriptor>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn descriptor(
    id: &str,
    name: &str,
    capabilities: &[ModelCapability],
    max_context_tokens: u32,
    max_output_tokens: u32,
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        capabilities: capabilities.to_vec(),
        max_context_tokens: Some(max_context_tokens),
        max_output_tokens: Some(max_output_tokens),
    }
}

impl Catalog {
    /// The catalog compiled into this crate.
    #[must_use]
    pub fn builtin() -> Self {
        use ModelCapability::*;

        let mut builtin = BTreeMap::new();
        builtin.insert(
            "anthropic".to_string(),
            vec![
                descriptor(
                    "claude-sonnet-4-20250514",
                    "Claude Sonnet 4",
                    &[ToolCalling, Vision, Streaming, StructuredOutput, Document],
                    200_000,
                    64_000,
                ),
                descriptor(
                    "claude-haiku-4-5-20251001",
                    "Claude Haiku 4.5",
                    &[ToolCalling, Vision, Streaming, StructuredOutput],
                    200_000,
                    8_192,
                ),
                descriptor(
                    "claude-opus-4-20250514",
                    "Claude Opus 4",
                    &[
                        ToolCalling,
                        Vision,
                        Streaming,
                        StructuredOutput,
                        Reasoning,
                        LongContext,
                        Document,
                    ],
                    200_000,
                    32_000,
                ),
            ],
        );
        builtin.insert(
            "openai".to_string(),
            vec![
                descriptor(
                    "gpt-4o",
                    "GPT-4o",
                    &[ToolCalling, Vision, Streaming, StructuredOutput],
                    128_000,
                    16_384,
                ),
                descriptor(
                    "gpt-4o-mini",
                    "GPT-4o Mini",
                    &[ToolCalling, Vision, Streaming, StructuredOutput],
                    128_000,
                    16_384,
                ),
                descriptor("o3-mini", "O3 Mini", &[Streaming, Reasoning], 200_000, 100_000),
                descriptor("o1", "O1", &[Streaming, Reasoning, Vision], 200_000, 100_000),
            ],
        );
        builtin.insert(
            "google".to_string(),
            vec![
                descriptor(
                    "gemini-2.0-flash",
                    "Gemini 2.0 Flash",
                    &[ToolCalling, Vision, Streaming],
                    1_048_576,
                    8_192,
                ),
                descriptor(
                    "gemini-2.5-pro",
                    "Gemini 2.5 Pro",
                    &[ToolCalling, Vision, Streaming, Reasoning, LongContext],
                    1_048_576,
                    65_536,
                ),
                descriptor(
                    "gemini-2.5-flash",
                    "Gemini 2.5 Flash",
                    &[ToolCalling, Vision, Streaming],
                    1_048_576,
                    65_536,
                ),
            ],
        );

        Self { builtin }
    }

    /// Replaces the model list for `provider`, adding the provider if new.
    #[must_use]
    pub fn with_models(mut self, provider: &str, models: Vec<ModelDescriptor>) -> Self {
        self.builtin.insert(provider.to_string(), models);
        self
    }

    #[must_use]
    pub fn models(&self, provider: &str) -> &[ModelDescriptor] {
        self.builtin.get(provider).map(Vec::as_slice).unwrap_or(&[])
    }

    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.builtin.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn find(&self, provider: &str, model_id: &str) -> Option<&ModelDescriptor> {
        self.models(provider).iter().find(|m| m.id == model_id)
    }

    /// First listed model of a provider, used as its default.
    #[must_use]
    pub fn default_model(&self, provider: &str) -> Option<&str> {
        self.models(provider).first().map(|m| m.id.as_str())
    }

    /// Built-in models of every enabled provider followed by each custom
    /// provider's models, minus anything in `disabled`.
    #[must_use]
    pub fn available_models(
        &self,
        enabled_providers: &[String],
        custom_providers: &[CustomProvider],
        disabled: &HashSet<String>,
    ) -> Vec<ModelInfo> {
        let mut models = Vec::new();

        for provider in enabled_providers {
            for model in self.models(provider) {
                if disabled.contains(&model.id) {
                    continue;
                }
                models.push(ModelInfo {
                    id: model.id.clone(),
                    name: model.name.clone(),
                    provider: provider.clone(),
                    capabilities: model
                        .capabilities
                        .iter()
                        .map(|c| capability_name(*c).to_string())
                        .collect(),
                    max_context_tokens: model.max_context_tokens,
                    max_output_tokens: model.max_output_tokens,
                    is_custom: false,
                    custom_provider_id: None,
                });
            }
        }

        for custom in custom_providers {
            for model in &custom.available_models {
                if model.id.is_empty() || disabled.contains(&model.id) {
                    continue;
                }
                models.push(ModelInfo {
                    id: model.id.clone(),
                    name: model.name.clone().unwrap_or_else(|| model.id.clone()),
                    provider: CUSTOM_PROVIDER.to_string(),
                    capabilities: model.capabilities.clone(),
                    max_context_tokens: model.max_context_tokens,
                    max_output_tokens: model.max_output_tokens,
                    is_custom: true,
                    custom_provider_id: Some(custom.id.clone()),
                });
            }
        }

        models
    }
}

#[must_use]
pub fn capability_name(capability: ModelCapability) -> &'static str {
    match capability {
        ModelCapability::ToolCalling => "tool_calling",
        ModelCapability::Vision => "vision",
        ModelCapability::Streaming => "streaming",
        ModelCapability::StructuredOutput => "structured_output",
        ModelCapability::Reasoning => "reasoning",
        ModelCapability::LongContext => "long_context",
        ModelCapability::Document => "document",
    }
}
