use clap::Subcommand;

#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Store a provider API key for an organization or team
    Set {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Provider: anthropic, openai, or google
        #[arg(long)]
        provider: String,

        /// Organization ID
        #[arg(long)]
        org: String,

        /// Team ID; stores a team-level override
        #[arg(long)]
        team: Option<String>,

        /// API key value
        #[arg(long, env = "MODELGATE_CREDENTIAL", hide_env_values = true)]
        value: String,
    },

    /// Remove a stored provider API key
    Delete {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Provider: anthropic, openai, or google
        #[arg(long)]
        provider: String,

        /// Organization ID
        #[arg(long)]
        org: String,

        /// Team ID; removes the team-level override
        #[arg(long)]
        team: Option<String>,
    },

    /// Show where each provider's key is configured
    Status {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Organization ID
        #[arg(long)]
        org: String,

        /// Team ID
        #[arg(long)]
        team: Option<String>,

        /// Limit to one provider
        #[arg(long)]
        provider: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Print the decrypted secret stored at a path
    Get {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Secret path, e.g. /organizations/{org}/mcp/mcp_server_{id}
        #[arg(long)]
        path: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encrypt and store a secret at a path
    Set {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Secret path
        #[arg(long)]
        path: String,

        /// Secret value
        #[arg(long, env = "MODELGATE_SECRET_VALUE", hide_env_values = true)]
        value: String,
    },

    /// Delete the secret stored at a path
    Delete {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Secret path
        #[arg(long)]
        path: String,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show the effective settings for a user
    Effective {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// User ID
        #[arg(long)]
        user: String,

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

    /// Update organization defaults and permissions
    Org(OrgSettingsArgs),

    /// Update a team's overrides
    Team(TeamSettingsArgs),

    /// Update a user's preferences
    User(UserSettingsArgs),
}

#[derive(clap::Args)]
pub struct OrgSettingsArgs {
    /// Data directory for the database and config file
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// Organization ID
    #[arg(long)]
    pub org: String,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub display_name: Option<String>,

    #[arg(long)]
    pub clear_display_name: bool,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Use the provider's default output limit
    #[arg(long)]
    pub clear_max_tokens: bool,

    #[arg(long)]
    pub top_p: Option<f64>,

    #[arg(long)]
    pub fallback_enabled: Option<bool>,

    /// Comma-separated fallback model IDs
    #[arg(long, value_delimiter = ',')]
    pub fallback_models: Option<Vec<String>>,

    #[arg(long)]
    pub clear_fallback_models: bool,

    #[arg(long)]
    pub allow_team_customization: Option<bool>,

    #[arg(long)]
    pub allow_user_customization: Option<bool>,

    #[arg(long)]
    pub allow_per_request_selection: Option<bool>,

    /// Comma-separated provider names
    #[arg(long, value_delimiter = ',')]
    pub enabled_providers: Option<Vec<String>>,

    /// Comma-separated model IDs
    #[arg(long, value_delimiter = ',')]
    pub disabled_models: Option<Vec<String>>,

    #[arg(long)]
    pub clear_disabled_models: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct TeamSettingsArgs {
    /// Data directory for the database and config file
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// Organization ID the team belongs to
    #[arg(long)]
    pub org: String,

    /// Team ID
    #[arg(long)]
    pub team: String,

    #[arg(long)]
    pub provider: Option<String>,

    /// Inherit the provider from the organization
    #[arg(long)]
    pub clear_provider: bool,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub clear_model: bool,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub clear_temperature: bool,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    #[arg(long)]
    pub clear_max_tokens: bool,

    #[arg(long)]
    pub allow_user_customization: Option<bool>,

    /// Comma-separated model IDs, added to the organization's list
    #[arg(long, value_delimiter = ',')]
    pub disabled_models: Option<Vec<String>>,

    #[arg(long)]
    pub clear_disabled_models: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct UserSettingsArgs {
    /// Data directory for the database and config file
    #[arg(long, default_value = "./data")]
    pub data_dir: String,

    /// User ID
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub provider: Option<String>,

    #[arg(long)]
    pub clear_provider: bool,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub clear_model: bool,

    #[arg(long)]
    pub temperature: Option<f64>,

    #[arg(long)]
    pub clear_temperature: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
