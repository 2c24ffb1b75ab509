//! # Modelgate
//!
//! Per-request resolution of which LLM provider, model, and parameters a
//! caller should use, and which credential authorizes the call, across an
//! organization → team → user hierarchy.
//!
//! Provider keys and other secrets are stored encrypted (AES-256-GCM, key
//! derived from a master secret) under hierarchical paths and resolved along
//! a team → organization → environment fallback chain. Settings are layered
//! with permission flags that can veto lower-level overrides.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! modelgate = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use modelgate::config::AppConfig;
//! use modelgate::state::AppState;
//!
//! let config = AppConfig::load("./data")?;
//! let state = AppState::open(config)?;
//!
//! let resolution = state.settings.resolve("user-1", "org-1", Some("team-1"))?;
//! println!("{} / {}", resolution.settings.provider, resolution.settings.model);
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module. Disable with `default-features = false`.

pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod secrets;
pub mod settings;
pub mod state;
pub mod store;
pub mod types;
