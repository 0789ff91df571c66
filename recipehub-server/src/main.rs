//! recipehub-server - Recipe import and AI service
//!
//! Imports third-party recipes into the RecipeHub catalog, generates missing
//! directions, answers recipe chat, and records live-session webhooks.

use anyhow::{Context, Result};
use clap::Parser;
use recipehub_common::config::{self, ApiKey, TomlConfig, DEFAULT_PORT};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use recipehub_server::config::resolve_api_key;
use recipehub_server::services::llm::create_provider;
use recipehub_server::services::{
    Importer, RecipeSource, SpoonacularClient, VideoSearch, WebhookVerifier, YouTubeClient,
};
use recipehub_server::AppState;

/// How often expired shared rate-limit counters are purged
const COUNTER_PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Parser)]
#[command(name = "recipehub-server", version, about = "RecipeHub import and AI service")]
struct Args {
    /// HTTP port (defaults to TOML `port`, then 5780)
    #[arg(short, long, env = "RECIPEHUB_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long, env = "RECIPEHUB_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Bootstrap TOML file
    #[arg(short, long, env = "RECIPEHUB_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let toml_config = config::load_toml_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    recipehub_common::logging::init_tracing(&toml_config.logging, &["tower_http=debug", "sqlx=warn"])?;

    info!("Starting recipehub-server");
    info!(
        "Version: {} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Config: {}", config_path.display());

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;

    let db_path = config::database_path(&root_folder);
    info!("Database: {}", db_path.display());
    let db = recipehub_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let state = build_state(db, &toml_config, config_path).await?;

    if toml_config.chat.shared_counters {
        spawn_counter_purge(state.db.clone());
    }

    let app = recipehub_server::build_router(state);

    let port = args.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("recipehub-server stopped");
    Ok(())
}

/// Resolve credentials and wire every collaborator that has them
async fn build_state(db: sqlx::SqlitePool, toml: &TomlConfig, config_path: PathBuf) -> Result<AppState> {
    let spoonacular = resolve_api_key(&db, toml, ApiKey::Spoonacular).await?;
    let youtube = resolve_api_key(&db, toml, ApiKey::YouTube).await?;
    let openrouter = resolve_api_key(&db, toml, ApiKey::OpenRouter).await?;
    let groq = resolve_api_key(&db, toml, ApiKey::Groq).await?;
    let livekit_key = resolve_api_key(&db, toml, ApiKey::LiveKitKey).await?;
    let livekit_secret = resolve_api_key(&db, toml, ApiKey::LiveKitSecret).await?;

    let mut state = AppState::new(db.clone(), &toml.chat).with_config_path(config_path);

    match create_provider(&toml.ai, openrouter.map(|k| k.value), groq.map(|k| k.value)) {
        Ok(provider) => {
            info!(provider = provider.provider_name(), model = provider.model_name(), "Text generation enabled");
            state = state.with_llm(provider, &toml.ai);
        }
        Err(e) => warn!("Text generation disabled: {}", e),
    }

    match spoonacular.map(|k| SpoonacularClient::new(k.value)).transpose() {
        Ok(Some(client)) => {
            let source: Arc<dyn RecipeSource> = Arc::new(client);
            let mut importer = Importer::new(db.clone(), source.clone(), toml.import.clone());

            if let Some(generator) = state.directions.clone() {
                importer = importer.with_direction_generator(generator);
            }
            match youtube.map(|k| YouTubeClient::new(k.value)).transpose() {
                Ok(Some(client)) => {
                    let videos: Arc<dyn VideoSearch> = Arc::new(client);
                    importer = importer.with_video_search(videos);
                }
                Ok(None) => info!("YouTube API key not set; imports will not attach videos"),
                Err(e) => warn!("Video lookup disabled: {}", e),
            }

            state = state.with_recipe_source(source).with_importer(importer);
        }
        Ok(None) => warn!("Spoonacular API key not set; search and import are disabled"),
        Err(e) => warn!("Recipe import disabled: {}", e),
    }

    match (livekit_key, livekit_secret) {
        (Some(k), Some(s)) => match WebhookVerifier::new(&k.value, &s.value) {
            Ok(verifier) => state = state.with_webhook_verifier(verifier),
            Err(e) => warn!("LiveKit webhook disabled: {}", e),
        },
        _ => warn!("LiveKit credentials not set; webhook deliveries will be rejected"),
    }

    Ok(state)
}

fn spawn_counter_purge(db: sqlx::SqlitePool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(COUNTER_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp();
            match recipehub_server::db::rate_limits::purge_expired(&db, now).await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Purged expired rate-limit counters"),
                Err(e) => warn!("Rate-limit counter purge failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
