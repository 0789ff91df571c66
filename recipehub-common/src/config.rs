//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in a small TOML file. Everything in it is
//! optional: a missing file yields defaults plus a warning, never a startup
//! failure.
//!
//! Root folder priority:
//! 1. Command-line argument
//! 2. `RECIPEHUB_ROOT_FOLDER` environment variable
//! 3. `root_folder` in the TOML file
//! 4. OS-dependent default
//!
//! API keys are resolved by the server (database → environment → TOML); the
//! key catalogue is defined here so both sides agree on names.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "RECIPEHUB_ROOT_FOLDER";

/// Default HTTP port for recipehub-server
pub const DEFAULT_PORT: u16 = 5780;

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "recipehub.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port (optional, CLI and env take precedence)
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Third-party API credentials (lowest-priority source)
    #[serde(default)]
    pub api_keys: ApiKeysConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// API keys as written in the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    #[serde(default)]
    pub spoonacular: Option<String>,
    #[serde(default)]
    pub youtube: Option<String>,
    #[serde(default)]
    pub openrouter: Option<String>,
    #[serde(default)]
    pub groq: Option<String>,
    #[serde(default)]
    pub livekit_api_key: Option<String>,
    #[serde(default)]
    pub livekit_api_secret: Option<String>,
}

/// LLM provider selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// "openrouter", "groq" or "fake"
    #[serde(default = "default_ai_provider")]
    pub provider: String,

    /// Model used for recipe chat (provider default when unset)
    #[serde(default)]
    pub chat_model: Option<String>,

    /// Model used for direction generation (provider default when unset)
    #[serde(default)]
    pub directions_model: Option<String>,

    /// Sent to OpenRouter as X-Title
    #[serde(default = "default_site_name")]
    pub site_name: String,

    /// Sent to OpenRouter as HTTP-Referer
    #[serde(default = "default_site_url")]
    pub site_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            chat_model: None,
            directions_model: None,
            site_name: default_site_name(),
            site_url: default_site_url(),
        }
    }
}

/// Import pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Fixed pause between bulk-import items
    #[serde(default = "default_inter_item_delay_ms")]
    pub inter_item_delay_ms: u64,

    /// Character budget for recipe summaries
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Servings assumed by direction generation when none are known
    #[serde(default = "default_servings")]
    pub default_servings: u32,

    /// Upper bound for a single bulk import request
    #[serde(default = "default_max_bulk_count")]
    pub max_bulk_count: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: default_inter_item_delay_ms(),
            summary_max_chars: default_summary_max_chars(),
            default_servings: default_servings(),
            max_bulk_count: default_max_bulk_count(),
        }
    }
}

/// Chat endpoint rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Requests allowed per user per window
    #[serde(default = "default_chat_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_chat_window_secs")]
    pub window_secs: u64,

    /// Keep counters in the database so several instances share them
    #[serde(default)]
    pub shared_counters: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_requests: default_chat_max_requests(),
            window_secs: default_chat_window_secs(),
            shared_counters: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ai_provider() -> String {
    "openrouter".to_string()
}

fn default_site_name() -> String {
    "RecipeHub".to_string()
}

fn default_site_url() -> String {
    format!("http://localhost:{}", DEFAULT_PORT)
}

fn default_inter_item_delay_ms() -> u64 {
    1000
}

fn default_summary_max_chars() -> usize {
    200
}

fn default_servings() -> u32 {
    4
}

fn default_max_bulk_count() -> u32 {
    100
}

fn default_chat_max_requests() -> u32 {
    50
}

fn default_chat_window_secs() -> u64 {
    3600
}

/// Third-party credentials the server knows how to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKey {
    Spoonacular,
    YouTube,
    OpenRouter,
    Groq,
    LiveKitKey,
    LiveKitSecret,
}

impl ApiKey {
    pub const ALL: [ApiKey; 6] = [
        ApiKey::Spoonacular,
        ApiKey::YouTube,
        ApiKey::OpenRouter,
        ApiKey::Groq,
        ApiKey::LiveKitKey,
        ApiKey::LiveKitSecret,
    ];

    /// Key name in the `settings` table
    pub fn settings_key(self) -> &'static str {
        match self {
            ApiKey::Spoonacular => "spoonacular_api_key",
            ApiKey::YouTube => "youtube_api_key",
            ApiKey::OpenRouter => "openrouter_api_key",
            ApiKey::Groq => "groq_api_key",
            ApiKey::LiveKitKey => "livekit_api_key",
            ApiKey::LiveKitSecret => "livekit_api_secret",
        }
    }

    /// Environment variable name
    pub fn env_var(self) -> &'static str {
        match self {
            ApiKey::Spoonacular => "SPOONACULAR_API_KEY",
            ApiKey::YouTube => "YOUTUBE_API_KEY",
            ApiKey::OpenRouter => "OPENROUTER_API_KEY",
            ApiKey::Groq => "GROQ_API_KEY",
            ApiKey::LiveKitKey => "LIVEKIT_API_KEY",
            ApiKey::LiveKitSecret => "LIVEKIT_API_SECRET",
        }
    }

    /// Value from the TOML `[api_keys]` table, if present
    pub fn from_toml(self, keys: &ApiKeysConfig) -> Option<&String> {
        match self {
            ApiKey::Spoonacular => keys.spoonacular.as_ref(),
            ApiKey::YouTube => keys.youtube.as_ref(),
            ApiKey::OpenRouter => keys.openrouter.as_ref(),
            ApiKey::Groq => keys.groq.as_ref(),
            ApiKey::LiveKitKey => keys.livekit_api_key.as_ref(),
            ApiKey::LiveKitSecret => keys.livekit_api_secret.as_ref(),
        }
    }

    /// Store a value into the TOML `[api_keys]` table
    pub fn set_in_toml(self, keys: &mut ApiKeysConfig, value: String) {
        let slot = match self {
            ApiKey::Spoonacular => &mut keys.spoonacular,
            ApiKey::YouTube => &mut keys.youtube,
            ApiKey::OpenRouter => &mut keys.openrouter,
            ApiKey::Groq => &mut keys.groq,
            ApiKey::LiveKitKey => &mut keys.livekit_api_key,
            ApiKey::LiveKitSecret => &mut keys.livekit_api_secret,
        };
        *slot = Some(value);
    }

    /// Reverse lookup from a settings key
    pub fn from_settings_key(key: &str) -> Option<ApiKey> {
        Self::ALL.into_iter().find(|k| k.settings_key() == key)
    }
}

/// Load bootstrap configuration
///
/// A missing file is not an error: defaults are returned and a warning is
/// logged. A file that exists but does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write configuration back to disk
///
/// Writes to a sibling temp file first and renames it into place so readers
/// never observe a half-written file.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;

    // The file carries API keys
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Default location of the bootstrap TOML file
///
/// `~/.config/recipehub/recipehub.toml` on Linux, the platform config dir elsewhere.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("recipehub").join("recipehub.toml"))
        .unwrap_or_else(|| PathBuf::from("recipehub.toml"))
}

/// Resolve the root folder (see module docs for priority order)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("recipehub"))
        .unwrap_or_else(|| PathBuf::from("./recipehub_data"))
}

/// Database file location inside a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

/// User-Agent sent by every outbound HTTP client
pub fn get_user_agent() -> String {
    format!("RecipeHub/{} (+https://github.com/recipehub/recipehub)", env!("CARGO_PKG_VERSION"))
}
