mod commands;
mod credential;
mod models;
mod secret;
mod settings;

pub use commands::{
    CredentialCommands, OrgSettingsArgs, SecretCommands, SettingsCommands, TeamSettingsArgs,
    UserSettingsArgs,
};
pub use credential::{run_credential_delete, run_credential_set, run_credential_status};
pub use models::run_models;
pub use secret::{run_secret_delete, run_secret_get, run_secret_set};
pub use settings::{
    run_settings_effective, run_settings_org, run_settings_team, run_settings_user,
};

use std::sync::Arc;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::store::SqliteStore;

/// Load configuration and services for an initialized data directory.
///
/// The master secret is checked before the database is touched.
pub fn init_state(data_dir: &str) -> anyhow::Result<AppState> {
    let config = AppConfig::load(data_dir)?;
    config.require_master_secret()?;

    let db_path = config.db_path();
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run 'modelgate init' first.",
            db_path.display()
        );
    }

    let store = SqliteStore::new(&db_path)?;
    Ok(AppState::new(config, Arc::new(store))?)
}

/// Create the data directory and database.
pub fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = AppConfig::load(&data_dir)?;
    let db_path = config.db_path();
    let existed = db_path.exists();

    let state = AppState::open(config)?;
    state.shutdown()?;

    if existed {
        println!("Database already initialized at {}", db_path.display());
    } else {
        println!("Initialized database at {}", db_path.display());
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
