pub const SCHEMA: &str = r#"
-- Encrypted secrets, addressed by hierarchical path
CREATE TABLE IF NOT EXISTS encrypted_secrets (
    id TEXT PRIMARY KEY,
    path TEXT NOT NULL UNIQUE,
    encrypted_value TEXT NOT NULL,     -- cipher token, never plaintext
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- One row per organization with concrete defaults
CREATE TABLE IF NOT EXISTS organization_settings (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL UNIQUE,

    provider TEXT NOT NULL DEFAULT 'anthropic',
    model TEXT NOT NULL DEFAULT 'claude-sonnet-4-20250514',
    model_display_name TEXT,
    temperature REAL NOT NULL DEFAULT 0.7,
    max_tokens INTEGER,              -- NULL = provider default
    top_p REAL NOT NULL DEFAULT 1.0,

    fallback_enabled INTEGER NOT NULL DEFAULT 0,
    fallback_models TEXT NOT NULL DEFAULT '[]',

    -- Permission flags
    allow_team_customization INTEGER NOT NULL DEFAULT 1,
    allow_user_customization INTEGER NOT NULL DEFAULT 1,
    allow_per_request_selection INTEGER NOT NULL DEFAULT 1,

    -- Restrictions (JSON arrays)
    enabled_providers TEXT NOT NULL DEFAULT '["anthropic","openai","google"]',
    disabled_models TEXT NOT NULL DEFAULT '[]',

    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- Team overrides; NULL = inherit from organization
CREATE TABLE IF NOT EXISTS team_settings (
    id TEXT PRIMARY KEY,
    team_id TEXT NOT NULL UNIQUE,
    provider TEXT,
    model TEXT,
    temperature REAL,
    max_tokens INTEGER,
    allow_user_customization INTEGER NOT NULL DEFAULT 1,
    disabled_models TEXT NOT NULL DEFAULT '[]',   -- merged with organization list
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- User preferences; NULL = inherit
CREATE TABLE IF NOT EXISTS user_settings (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL UNIQUE,
    preferred_provider TEXT,
    preferred_model TEXT,
    preferred_temperature REAL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

-- OpenAI-compatible endpoints registered by organizations
CREATE TABLE IF NOT EXISTS custom_provider (
    id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    team_id TEXT,                    -- NULL = organization-wide
    name TEXT NOT NULL,
    provider_type TEXT NOT NULL DEFAULT 'openai_compatible',
    base_url TEXT NOT NULL,
    available_models TEXT NOT NULL DEFAULT '[]',
    is_enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_custom_provider_org ON custom_provider(organization_id);
CREATE INDEX IF NOT EXISTS idx_custom_provider_team ON custom_provider(team_id);
"#;
