use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modelgate::cli::{
    CredentialCommands, SecretCommands, SettingsCommands, run_credential_delete,
    run_credential_set, run_credential_status, run_init, run_models, run_secret_delete,
    run_secret_get, run_secret_set, run_settings_effective, run_settings_org, run_settings_team,
    run_settings_user,
};

#[derive(Parser)]
#[command(name = "modelgate")]
#[command(
    about = "Tenant-scoped LLM settings and encrypted provider credentials",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and database
    Init {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Manage provider API keys
    Credential {
        #[command(subcommand)]
        command: CredentialCommands,
    },

    /// Manage raw path-addressed secrets
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },

    /// Inspect and update model settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// List the models available to an organization or team
    Models {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Organization ID
        #[arg(long)]
        org: String,

        /// Team ID
        #[arg(long)]
        team: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("modelgate=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => run_init(data_dir)?,
        Commands::Credential { command } => match command {
            CredentialCommands::Set {
                data_dir,
                provider,
                org,
                team,
                value,
            } => run_credential_set(data_dir, provider, org, team, value)?,
            CredentialCommands::Delete {
                data_dir,
                provider,
                org,
                team,
            } => run_credential_delete(data_dir, provider, org, team)?,
            CredentialCommands::Status {
                data_dir,
                org,
                team,
                provider,
                json,
            } => run_credential_status(data_dir, org, team, provider, json)?,
        },
        Commands::Secret { command } => match command {
            SecretCommands::Get {
                data_dir,
                path,
                json,
            } => run_secret_get(data_dir, path, json)?,
            SecretCommands::Set {
                data_dir,
                path,
                value,
            } => run_secret_set(data_dir, path, value)?,
            SecretCommands::Delete { data_dir, path } => run_secret_delete(data_dir, path)?,
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Effective {
                data_dir,
                user,
                org,
                team,
                json,
            } => run_settings_effective(data_dir, user, org, team, json)?,
            SettingsCommands::Org(args) => run_settings_org(args)?,
            SettingsCommands::Team(args) => run_settings_team(args)?,
            SettingsCommands::User(args) => run_settings_user(args)?,
        },
        Commands::Models {
            data_dir,
            org,
            team,
            json,
        } => run_models(data_dir, org, team, json)?,
    }

    Ok(())
}
