use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::de::DeserializeOwned;

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn datetime_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(parse_datetime(&row.get::<_, String>(idx)?))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

const ORG_COLUMNS: &str = "id, organization_id, provider, model, model_display_name, temperature,
     max_tokens, top_p, fallback_enabled, fallback_models, allow_team_customization,
     allow_user_customization, allow_per_request_selection, enabled_providers,
     disabled_models, created_at, updated_at";

fn org_settings_from_row(row: &Row<'_>) -> rusqlite::Result<OrganizationSettings> {
    Ok(OrganizationSettings {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        provider: row.get(2)?,
        model: row.get(3)?,
        model_display_name: row.get(4)?,
        temperature: row.get(5)?,
        max_tokens: row.get(6)?,
        top_p: row.get(7)?,
        fallback_enabled: row.get(8)?,
        fallback_models: json_column(row, 9)?,
        allow_team_customization: row.get(10)?,
        allow_user_customization: row.get(11)?,
        allow_per_request_selection: row.get(12)?,
        enabled_providers: json_column(row, 13)?,
        disabled_models: json_column(row, 14)?,
        created_at: datetime_column(row, 15)?,
        updated_at: datetime_column(row, 16)?,
    })
}

const TEAM_COLUMNS: &str = "id, team_id, provider, model, temperature, max_tokens,
     allow_user_customization, disabled_models, created_at, updated_at";

fn team_settings_from_row(row: &Row<'_>) -> rusqlite::Result<TeamSettings> {
    Ok(TeamSettings {
        id: row.get(0)?,
        team_id: row.get(1)?,
        provider: row.get(2)?,
        model: row.get(3)?,
        temperature: row.get(4)?,
        max_tokens: row.get(5)?,
        allow_user_customization: row.get(6)?,
        disabled_models: json_column(row, 7)?,
        created_at: datetime_column(row, 8)?,
        updated_at: datetime_column(row, 9)?,
    })
}

const USER_COLUMNS: &str = "id, user_id, preferred_provider, preferred_model,
     preferred_temperature, created_at, updated_at";

fn user_settings_from_row(row: &Row<'_>) -> rusqlite::Result<UserSettings> {
    Ok(UserSettings {
        id: row.get(0)?,
        user_id: row.get(1)?,
        preferred_provider: row.get(2)?,
        preferred_model: row.get(3)?,
        preferred_temperature: row.get(4)?,
        created_at: datetime_column(row, 5)?,
        updated_at: datetime_column(row, 6)?,
    })
}

// Settings row helpers, shared by the plain trait methods and the
// `modify_*_settings` transactions.

fn insert_org_defaults(conn: &Connection, defaults: &OrganizationSettings) -> Result<()> {
    conn.execute(
        "INSERT INTO organization_settings (id, organization_id, provider, model,
            model_display_name, temperature, max_tokens, top_p, fallback_enabled,
            fallback_models, allow_team_customization, allow_user_customization,
            allow_per_request_selection, enabled_providers, disabled_models,
            created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
         ON CONFLICT (organization_id) DO NOTHING",
        params![
            defaults.id,
            defaults.organization_id,
            defaults.provider,
            defaults.model,
            defaults.model_display_name,
            defaults.temperature,
            defaults.max_tokens,
            defaults.top_p,
            defaults.fallback_enabled,
            serde_json::to_string(&defaults.fallback_models)?,
            defaults.allow_team_customization,
            defaults.allow_user_customization,
            defaults.allow_per_request_selection,
            serde_json::to_string(&defaults.enabled_providers)?,
            serde_json::to_string(&defaults.disabled_models)?,
            format_datetime(&defaults.created_at),
            format_datetime(&defaults.updated_at),
        ],
    )?;
    Ok(())
}

fn select_org_settings(
    conn: &Connection,
    organization_id: &str,
) -> Result<Option<OrganizationSettings>> {
    conn.query_row(
        &format!("SELECT {ORG_COLUMNS} FROM organization_settings WHERE organization_id = ?1"),
        params![organization_id],
        org_settings_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn write_org_settings(conn: &Connection, settings: &OrganizationSettings) -> Result<()> {
    let rows = conn.execute(
        "UPDATE organization_settings SET
            provider = ?1, model = ?2, model_display_name = ?3, temperature = ?4,
            max_tokens = ?5, top_p = ?6, fallback_enabled = ?7, fallback_models = ?8,
            allow_team_customization = ?9, allow_user_customization = ?10,
            allow_per_request_selection = ?11, enabled_providers = ?12,
            disabled_models = ?13, updated_at = ?14
         WHERE organization_id = ?15",
        params![
            settings.provider,
            settings.model,
            settings.model_display_name,
            settings.temperature,
            settings.max_tokens,
            settings.top_p,
            settings.fallback_enabled,
            serde_json::to_string(&settings.fallback_models)?,
            settings.allow_team_customization,
            settings.allow_user_customization,
            settings.allow_per_request_selection,
            serde_json::to_string(&settings.enabled_providers)?,
            serde_json::to_string(&settings.disabled_models)?,
            format_datetime(&settings.updated_at),
            settings.organization_id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

fn insert_team_defaults(conn: &Connection, defaults: &TeamSettings) -> Result<()> {
    conn.execute(
        "INSERT INTO team_settings (id, team_id, provider, model, temperature, max_tokens,
            allow_user_customization, disabled_models, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT (team_id) DO NOTHING",
        params![
            defaults.id,
            defaults.team_id,
            defaults.provider,
            defaults.model,
            defaults.temperature,
            defaults.max_tokens,
            defaults.allow_user_customization,
            serde_json::to_string(&defaults.disabled_models)?,
            format_datetime(&defaults.created_at),
            format_datetime(&defaults.updated_at),
        ],
    )?;
    Ok(())
}

fn select_team_settings(conn: &Connection, team_id: &str) -> Result<Option<TeamSettings>> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM team_settings WHERE team_id = ?1"),
        params![team_id],
        team_settings_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn write_team_settings(conn: &Connection, settings: &TeamSettings) -> Result<()> {
    let rows = conn.execute(
        "UPDATE team_settings SET
            provider = ?1, model = ?2, temperature = ?3, max_tokens = ?4,
            allow_user_customization = ?5, disabled_models = ?6, updated_at = ?7
         WHERE team_id = ?8",
        params![
            settings.provider,
            settings.model,
            settings.temperature,
            settings.max_tokens,
            settings.allow_user_customization,
            serde_json::to_string(&settings.disabled_models)?,
            format_datetime(&settings.updated_at),
            settings.team_id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

fn insert_user_defaults(conn: &Connection, defaults: &UserSettings) -> Result<()> {
    conn.execute(
        "INSERT INTO user_settings (id, user_id, preferred_provider, preferred_model,
            preferred_temperature, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT (user_id) DO NOTHING",
        params![
            defaults.id,
            defaults.user_id,
            defaults.preferred_provider,
            defaults.preferred_model,
            defaults.preferred_temperature,
            format_datetime(&defaults.created_at),
            format_datetime(&defaults.updated_at),
        ],
    )?;
    Ok(())
}

fn select_user_settings(conn: &Connection, user_id: &str) -> Result<Option<UserSettings>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM user_settings WHERE user_id = ?1"),
        params![user_id],
        user_settings_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn write_user_settings(conn: &Connection, settings: &UserSettings) -> Result<()> {
    let rows = conn.execute(
        "UPDATE user_settings SET
            preferred_provider = ?1, preferred_model = ?2, preferred_temperature = ?3,
            updated_at = ?4
         WHERE user_id = ?5",
        params![
            settings.preferred_provider,
            settings.preferred_model,
            settings.preferred_temperature,
            format_datetime(&settings.updated_at),
            settings.user_id,
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

const CUSTOM_PROVIDER_COLUMNS: &str = "id, organization_id, team_id, name, provider_type,
     base_url, available_models, is_enabled, created_at, updated_at";

fn custom_provider_from_row(row: &Row<'_>) -> rusqlite::Result<CustomProvider> {
    Ok(CustomProvider {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        team_id: row.get(2)?,
        name: row.get(3)?,
        provider_type: row.get(4)?,
        base_url: row.get(5)?,
        available_models: json_column(row, 6)?,
        is_enabled: row.get(7)?,
        created_at: datetime_column(row, 8)?,
        updated_at: datetime_column(row, 9)?,
    })
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Encrypted secret operations

    fn get_secret(&self, path: &str) -> Result<Option<EncryptedSecret>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, path, encrypted_value, created_at, updated_at
             FROM encrypted_secrets WHERE path = ?1",
            params![path],
            |row| {
                Ok(EncryptedSecret {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    ciphertext: row.get(2)?,
                    created_at: datetime_column(row, 3)?,
                    updated_at: datetime_column(row, 4)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn upsert_secret(&self, path: &str, ciphertext: &str) -> Result<()> {
        let now = format_datetime(&Utc::now());
        self.conn().execute(
            "INSERT INTO encrypted_secrets (id, path, encrypted_value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (path) DO UPDATE SET
                encrypted_value = excluded.encrypted_value,
                updated_at = excluded.updated_at",
            params![uuid::Uuid::new_v4().to_string(), path, ciphertext, now],
        )?;
        Ok(())
    }

    fn delete_secret(&self, path: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM encrypted_secrets WHERE path = ?1", params![path])?;
        Ok(rows > 0)
    }

    // Organization settings operations

    fn ensure_org_settings(&self, defaults: &OrganizationSettings) -> Result<OrganizationSettings> {
        let conn = self.conn();
        insert_org_defaults(&conn, defaults)?;
        select_org_settings(&conn, &defaults.organization_id)?.ok_or(Error::NotFound)
    }

    fn get_org_settings(&self, organization_id: &str) -> Result<Option<OrganizationSettings>> {
        select_org_settings(&self.conn(), organization_id)
    }

    fn modify_org_settings(
        &self,
        defaults: &OrganizationSettings,
        apply: &mut dyn FnMut(&mut OrganizationSettings) -> bool,
    ) -> Result<OrganizationSettings> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        insert_org_defaults(&tx, defaults)?;
        let mut settings =
            select_org_settings(&tx, &defaults.organization_id)?.ok_or(Error::NotFound)?;
        if apply(&mut settings) {
            write_org_settings(&tx, &settings)?;
        }

        tx.commit()?;
        Ok(settings)
    }

    // Team settings operations

    fn ensure_team_settings(&self, defaults: &TeamSettings) -> Result<TeamSettings> {
        let conn = self.conn();
        insert_team_defaults(&conn, defaults)?;
        select_team_settings(&conn, &defaults.team_id)?.ok_or(Error::NotFound)
    }

    fn get_team_settings(&self, team_id: &str) -> Result<Option<TeamSettings>> {
        select_team_settings(&self.conn(), team_id)
    }

    fn modify_team_settings(
        &self,
        defaults: &TeamSettings,
        apply: &mut dyn FnMut(&mut TeamSettings) -> bool,
    ) -> Result<TeamSettings> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        insert_team_defaults(&tx, defaults)?;
        let mut settings = select_team_settings(&tx, &defaults.team_id)?.ok_or(Error::NotFound)?;
        if apply(&mut settings) {
            write_team_settings(&tx, &settings)?;
        }

        tx.commit()?;
        Ok(settings)
    }

    // User settings operations

    fn ensure_user_settings(&self, defaults: &UserSettings) -> Result<UserSettings> {
        let conn = self.conn();
        insert_user_defaults(&conn, defaults)?;
        select_user_settings(&conn, &defaults.user_id)?.ok_or(Error::NotFound)
    }

    fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>> {
        select_user_settings(&self.conn(), user_id)
    }

    fn modify_user_settings(
        &self,
        defaults: &UserSettings,
        apply: &mut dyn FnMut(&mut UserSettings) -> bool,
    ) -> Result<UserSettings> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        insert_user_defaults(&tx, defaults)?;
        let mut settings = select_user_settings(&tx, &defaults.user_id)?.ok_or(Error::NotFound)?;
        if apply(&mut settings) {
            write_user_settings(&tx, &settings)?;
        }

        tx.commit()?;
        Ok(settings)
    }

    // Custom provider operations

    fn create_custom_provider(&self, provider: &CustomProvider) -> Result<()> {
        self.conn().execute(
            "INSERT INTO custom_provider (id, organization_id, team_id, name, provider_type,
                base_url, available_models, is_enabled, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                provider.id,
                provider.organization_id,
                provider.team_id,
                provider.name,
                provider.provider_type,
                provider.base_url,
                serde_json::to_string(&provider.available_models)?,
                provider.is_enabled,
                format_datetime(&provider.created_at),
                format_datetime(&provider.updated_at),
            ],
        )?;
        Ok(())
    }

    fn get_custom_provider(&self, id: &str) -> Result<Option<CustomProvider>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {CUSTOM_PROVIDER_COLUMNS} FROM custom_provider WHERE id = ?1"),
            params![id],
            custom_provider_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_custom_providers(
        &self,
        organization_id: &str,
        team_id: Option<&str>,
    ) -> Result<Vec<CustomProvider>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CUSTOM_PROVIDER_COLUMNS} FROM custom_provider
             WHERE organization_id = ?1 AND is_enabled = 1
               AND (?2 IS NULL OR team_id IS NULL OR team_id = ?2)
             ORDER BY created_at, id"
        ))?;

        let rows = stmt.query_map(params![organization_id, team_id], custom_provider_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_custom_provider(&self, provider: &CustomProvider) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE custom_provider SET
                name = ?1, base_url = ?2, available_models = ?3, is_enabled = ?4, updated_at = ?5
             WHERE id = ?6 AND organization_id = ?7",
            params![
                provider.name,
                provider.base_url,
                serde_json::to_string(&provider.available_models)?,
                provider.is_enabled,
                format_datetime(&provider.updated_at),
                provider.id,
                provider.organization_id,
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_custom_provider(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM custom_provider WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CustomModel;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn custom_provider(id: &str, team_id: Option<&str>, enabled: bool) -> CustomProvider {
        CustomProvider {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            team_id: team_id.map(str::to_string),
            name: format!("provider {id}"),
            provider_type: "openai_compatible".to_string(),
            base_url: "http://localhost:11434/v1".to_string(),
            available_models: vec![CustomModel::new("llama3")],
            is_enabled: enabled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_initialize_creates_tables() {
        let (_temp, store) = test_store();

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"encrypted_secrets".to_string()));
        assert!(tables.contains(&"organization_settings".to_string()));
        assert!(tables.contains(&"team_settings".to_string()));
        assert!(tables.contains(&"user_settings".to_string()));
        assert!(tables.contains(&"custom_provider".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_temp, store) = test_store();
        store.initialize().unwrap();
    }

    #[test]
    fn test_secret_upsert_overwrites_in_place() {
        let (_temp, store) = test_store();

        store.upsert_secret("/organizations/o1/openai_api_key", "token-a").unwrap();
        let first = store
            .get_secret("/organizations/o1/openai_api_key")
            .unwrap()
            .unwrap();

        store.upsert_secret("/organizations/o1/openai_api_key", "token-b").unwrap();
        let second = store
            .get_secret("/organizations/o1/openai_api_key")
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.ciphertext, "token-b");

        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM encrypted_secrets", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_secret_delete_reports_presence() {
        let (_temp, store) = test_store();
        store.upsert_secret("/organizations/o1/x", "t").unwrap();

        assert!(store.delete_secret("/organizations/o1/x").unwrap());
        assert!(!store.delete_secret("/organizations/o1/x").unwrap());
        assert!(store.get_secret("/organizations/o1/x").unwrap().is_none());
    }

    #[test]
    fn test_ensure_org_settings_keeps_existing_row() {
        let (_temp, store) = test_store();

        let created = store
            .ensure_org_settings(&OrganizationSettings::with_defaults("org-1"))
            .unwrap();
        assert_eq!(created.provider, DEFAULT_PROVIDER);
        assert_eq!(created.enabled_providers.len(), 3);

        store
            .modify_org_settings(&OrganizationSettings::with_defaults("org-1"), &mut |s| {
                s.model = "gpt-4o".to_string();
                s.provider = "openai".to_string();
                s.disabled_models = vec!["o1".to_string()];
                true
            })
            .unwrap();

        let again = store
            .ensure_org_settings(&OrganizationSettings::with_defaults("org-1"))
            .unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.model, "gpt-4o");
        assert_eq!(again.disabled_models, vec!["o1".to_string()]);
    }

    #[test]
    fn test_team_and_user_settings_roundtrip_nulls() {
        let (_temp, store) = test_store();

        let team = store
            .ensure_team_settings(&TeamSettings::with_defaults("team-1"))
            .unwrap();
        assert!(team.model.is_none());
        assert!(team.allow_user_customization);

        store
            .modify_team_settings(&TeamSettings::with_defaults("team-1"), &mut |t| {
                t.model = Some("gpt-4o".to_string());
                t.max_tokens = Some(2048);
                true
            })
            .unwrap();

        let fetched = store.get_team_settings("team-1").unwrap().unwrap();
        assert_eq!(fetched.id, team.id);
        assert_eq!(fetched.model.as_deref(), Some("gpt-4o"));
        assert_eq!(fetched.max_tokens, Some(2048));
        assert!(fetched.temperature.is_none());

        let user = store
            .ensure_user_settings(&UserSettings::with_defaults("user-1"))
            .unwrap();
        assert!(user.preferred_model.is_none());
        assert!(store.get_user_settings("user-2").unwrap().is_none());
    }

    #[test]
    fn test_modify_creates_missing_row() {
        let (_temp, store) = test_store();

        let user = store
            .modify_user_settings(&UserSettings::with_defaults("ghost"), &mut |u| {
                u.preferred_temperature = Some(1.5);
                true
            })
            .unwrap();
        assert_eq!(user.preferred_temperature, Some(1.5));

        let fetched = store.get_user_settings("ghost").unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.preferred_temperature, Some(1.5));
    }

    #[test]
    fn test_modify_without_change_skips_write() {
        let (_temp, store) = test_store();
        let created = store
            .ensure_user_settings(&UserSettings::with_defaults("user-1"))
            .unwrap();

        let unchanged = store
            .modify_user_settings(&UserSettings::with_defaults("user-1"), &mut |u| {
                u.preferred_model = Some("discarded".to_string());
                false
            })
            .unwrap();
        assert_eq!(unchanged.id, created.id);

        let fetched = store.get_user_settings("user-1").unwrap().unwrap();
        assert!(fetched.preferred_model.is_none());
    }

    #[test]
    fn test_concurrent_modifies_keep_every_field() {
        use std::sync::Arc;
        use std::thread;

        let (_temp, store) = test_store();
        let store = Arc::new(store);

        for round in 0..20 {
            let org_id = format!("org-{round}");
            let writers: [fn(&mut OrganizationSettings); 5] = [
                |s: &mut OrganizationSettings| s.model = "gpt-4o".to_string(),
                |s: &mut OrganizationSettings| s.temperature = 0.2,
                |s: &mut OrganizationSettings| s.max_tokens = Some(4096),
                |s: &mut OrganizationSettings| s.allow_team_customization = false,
                |s: &mut OrganizationSettings| s.disabled_models = vec!["o1".to_string()],
            ];

            let handles: Vec<_> = writers
                .into_iter()
                .map(|write| {
                    let store = store.clone();
                    let org_id = org_id.clone();
                    thread::spawn(move || {
                        store
                            .modify_org_settings(
                                &OrganizationSettings::with_defaults(&org_id),
                                &mut |s| {
                                    write(s);
                                    true
                                },
                            )
                            .unwrap();
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let settings = store.get_org_settings(&org_id).unwrap().unwrap();
            assert_eq!(settings.model, "gpt-4o");
            assert_eq!(settings.temperature, 0.2);
            assert_eq!(settings.max_tokens, Some(4096));
            assert!(!settings.allow_team_customization);
            assert_eq!(settings.disabled_models, vec!["o1".to_string()]);
        }
    }

    #[test]
    fn test_list_custom_providers_scoping() {
        let (_temp, store) = test_store();

        store.create_custom_provider(&custom_provider("cp-org", None, true)).unwrap();
        store
            .create_custom_provider(&custom_provider("cp-team", Some("team-1"), true))
            .unwrap();
        store
            .create_custom_provider(&custom_provider("cp-other", Some("team-2"), true))
            .unwrap();
        store
            .create_custom_provider(&custom_provider("cp-off", None, false))
            .unwrap();

        let mut all: Vec<String> = store
            .list_custom_providers("org-1", None)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        all.sort();
        assert_eq!(
            all,
            vec![
                "cp-org".to_string(),
                "cp-other".to_string(),
                "cp-team".to_string()
            ]
        );

        let mut team: Vec<String> = store
            .list_custom_providers("org-1", Some("team-1"))
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        team.sort();
        assert_eq!(team, vec!["cp-org".to_string(), "cp-team".to_string()]);
    }

    #[test]
    fn test_custom_provider_update_and_delete() {
        let (_temp, store) = test_store();
        let mut provider = custom_provider("cp-1", None, true);
        store.create_custom_provider(&provider).unwrap();

        provider.available_models.push(CustomModel::new("qwen"));
        provider.is_enabled = false;
        store.update_custom_provider(&provider).unwrap();

        let fetched = store.get_custom_provider("cp-1").unwrap().unwrap();
        assert_eq!(fetched.available_models.len(), 2);
        assert!(!fetched.is_enabled);

        let mut foreign = fetched.clone();
        foreign.organization_id = "org-2".to_string();
        foreign.name = "hijacked".to_string();
        assert!(matches!(
            store.update_custom_provider(&foreign),
            Err(Error::NotFound)
        ));
        assert_eq!(store.get_custom_provider("cp-1").unwrap().unwrap().name, "provider cp-1");

        assert!(store.delete_custom_provider("cp-1").unwrap());
        assert!(store.get_custom_provider("cp-1").unwrap().is_none());
    }
}
