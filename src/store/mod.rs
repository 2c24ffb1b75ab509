pub mod path;
mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the persistence interface for secrets and settings rows.
///
/// Every write touches a single row. `modify_*_settings` creates the row from
/// `defaults` when missing, then runs `apply` on it and writes it back in one
/// transaction when `apply` returns true.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Encrypted secret operations
    fn get_secret(&self, path: &str) -> Result<Option<EncryptedSecret>>;
    fn upsert_secret(&self, path: &str, ciphertext: &str) -> Result<()>;
    fn delete_secret(&self, path: &str) -> Result<bool>;

    // Organization settings operations
    fn ensure_org_settings(&self, defaults: &OrganizationSettings) -> Result<OrganizationSettings>;
    fn get_org_settings(&self, organization_id: &str) -> Result<Option<OrganizationSettings>>;
    fn modify_org_settings(
        &self,
        defaults: &OrganizationSettings,
        apply: &mut dyn FnMut(&mut OrganizationSettings) -> bool,
    ) -> Result<OrganizationSettings>;

    // Team settings operations
    fn ensure_team_settings(&self, defaults: &TeamSettings) -> Result<TeamSettings>;
    fn get_team_settings(&self, team_id: &str) -> Result<Option<TeamSettings>>;
    fn modify_team_settings(
        &self,
        defaults: &TeamSettings,
        apply: &mut dyn FnMut(&mut TeamSettings) -> bool,
    ) -> Result<TeamSettings>;

    // User settings operations
    fn ensure_user_settings(&self, defaults: &UserSettings) -> Result<UserSettings>;
    fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>>;
    fn modify_user_settings(
        &self,
        defaults: &UserSettings,
        apply: &mut dyn FnMut(&mut UserSettings) -> bool,
    ) -> Result<UserSettings>;

    // Custom provider operations
    fn create_custom_provider(&self, provider: &CustomProvider) -> Result<()>;
    fn get_custom_provider(&self, id: &str) -> Result<Option<CustomProvider>>;
    /// Enabled providers of an organization. With a team, only the
    /// organization-wide providers plus that team's own.
    fn list_custom_providers(
        &self,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<Vec<CustomProvider>>;
    /// Updates the row matching both `id` and `organization_id`.
    fn update_custom_provider(&self, provider: &CustomProvider) -> Result<()>;
    fn delete_custom_provider(&self, id: &str) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
