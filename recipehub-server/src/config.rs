//! Configuration resolution for recipehub-server
//!
//! API keys resolve with Database → ENV → TOML priority. The database is
//! authoritative because the settings endpoint writes there; TOML is kept as
//! a best-effort backup copy.

use recipehub_common::config::{ApiKey, TomlConfig};
use recipehub_common::Result;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// API key resolved at startup together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub value: String,
    pub source: &'static str,
}

/// Resolve one API key from the 3-tier configuration
///
/// Returns `None` when no tier carries a usable value; callers decide whether
/// the key is required.
pub async fn resolve_api_key(
    db: &Pool<Sqlite>,
    toml_config: &TomlConfig,
    key: ApiKey,
) -> Result<Option<ResolvedKey>> {
    let db_key = crate::db::settings::get_api_key(db, key)
        .await?
        .filter(|k| is_valid_key(k));
    let env_key = std::env::var(key.env_var()).ok().filter(|k| is_valid_key(k));
    let toml_key = key
        .from_toml(&toml_config.api_keys)
        .filter(|k| is_valid_key(k))
        .cloned();

    let sources: Vec<&str> = [
        db_key.as_ref().map(|_| "database"),
        env_key.as_ref().map(|_| "environment"),
        toml_key.as_ref().map(|_| "TOML"),
    ]
    .into_iter()
    .flatten()
    .collect();

    // Multiple sources usually means a stale copy somewhere
    if sources.len() > 1 {
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            key.settings_key(),
            sources.join(", "),
            sources[0]
        );
    }

    let resolved = db_key
        .map(|value| ResolvedKey { value, source: "database" })
        .or_else(|| env_key.map(|value| ResolvedKey { value, source: "environment" }))
        .or_else(|| toml_key.map(|value| ResolvedKey { value, source: "TOML" }));

    match &resolved {
        Some(k) => info!("{} loaded from {}", key.settings_key(), k.source),
        None => debug!(
            "{} not configured (set {} or [api_keys] in TOML)",
            key.settings_key(),
            key.env_var()
        ),
    }

    Ok(resolved)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Sync settings from database to TOML file
///
/// HashMap keys are settings keys (`spoonacular_api_key`, ...). Unknown keys
/// are ignored. A TOML write failure is logged and swallowed: the database
/// write has already succeeded by the time this runs.
pub async fn sync_settings_to_toml(
    settings: HashMap<String, String>,
    toml_path: &Path,
) -> Result<()> {
    let mut config = recipehub_common::config::load_toml_config(toml_path)?;

    for (settings_key, value) in settings {
        match ApiKey::from_settings_key(&settings_key) {
            Some(key) => key.set_in_toml(&mut config.api_keys, value),
            None => debug!(key = %settings_key, "Setting has no TOML counterpart, skipping"),
        }
    }

    match recipehub_common::config::write_toml_config(&config, toml_path) {
        Ok(()) => {
            info!("Settings synced to TOML: {}", toml_path.display());
            Ok(())
        }
        Err(e) => {
            warn!("TOML write failed (database write succeeded): {}", e);
            Ok(())
        }
    }
}
