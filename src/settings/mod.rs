//! Organization → team → user model settings.

mod custom;
mod hierarchy;
mod update;

pub use custom::{CustomProviderUpdate, NewCustomProvider};
pub use hierarchy::{SettingsHierarchy, merge_settings};
pub use update::{OrganizationSettingsUpdate, TeamSettingsUpdate, UserSettingsUpdate};
