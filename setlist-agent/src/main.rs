//! setlist - natural-language playlist builder
//!
//! Turns one free-text request into a Spotify playlist:
//! extract intent → recommend similar songs → filter by energy → create playlist.

use anyhow::{Context, Result};
use clap::Parser;
use setlist_agent::services::{OpenAiClient, SpotifyAuth, SpotifyClient, SPOTIFY_SCOPES};
use setlist_agent::{config, Pipeline};
use setlist_common::config::{load_config, resolve_config_path, write_toml_config, ConfigSource, TomlConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", ",
    env!("BUILD_PROFILE"),
    ")"
);

const DEMO_REQUEST: &str = "Create a playlist called This works.";

/// Command-line arguments for setlist
#[derive(Parser, Debug)]
#[command(name = "setlist")]
#[command(about = "Build a Spotify playlist from a natural-language request")]
#[command(version, long_version = LONG_VERSION)]
struct Args {
    /// Playlist request, e.g. "10 energetic songs like Blinding Lights by The Weeknd in a playlist called Run"
    request: Vec<String>,

    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Print the final state and stage trace as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Variables already present in the environment take precedence over .env
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config_source = resolve_config_path(args.config.as_deref());
    let toml_config = load_config(&config_source).context("Failed to load configuration")?;

    setlist_common::logging::init_tracing(args.log_level.as_deref(), &toml_config.logging)
        .context("Failed to initialize logging")?;

    info!("Starting setlist {}", LONG_VERSION);
    if let Some(path) = config_source.path() {
        info!("Config file: {}", path.display());
    }

    let request = if args.request.is_empty() {
        info!("No request given, using demo request");
        DEMO_REQUEST.to_string()
    } else {
        args.request.join(" ")
    };

    // Service clients are built once and shared by every stage
    let openai_key = config::resolve_openai_api_key(&toml_config)?;
    let completion = Arc::new(
        OpenAiClient::new(&toml_config.openai, openai_key).context("Failed to create OpenAI client")?,
    );
    info!("Language model: {}", completion.model());

    let auth = config::resolve_spotify_auth(&toml_config)?;
    if matches!(auth, SpotifyAuth::RefreshToken { .. }) {
        info!("Spotify scope required: {}", SPOTIFY_SCOPES);
    }
    let grant = auth
        .authorize(
            &toml_config.spotify.accounts_url,
            Duration::from_secs(toml_config.spotify.timeout_secs),
        )
        .await
        .context("Spotify authorization failed")?;

    if let Some(new_token) = &grant.rotated_refresh_token {
        persist_refresh_token(&config_source, &toml_config, new_token);
    }

    let catalog = Arc::new(
        SpotifyClient::new(&toml_config.spotify, grant.access_token)
            .context("Failed to create Spotify client")?,
    );

    let pipeline = Pipeline::new(completion, catalog, toml_config.pipeline);
    let report = pipeline.run(request).await.context("Playlist pipeline failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(uri) = report.playlist_uri() {
        println!("{}", uri);
    }

    Ok(())
}

/// Write a rotated refresh token back to the config file (logs and continues on failure)
fn persist_refresh_token(source: &ConfigSource, toml_config: &TomlConfig, new_token: &str) {
    let Some(path) = source.path() else {
        warn!("Spotify rotated the refresh token but no config file location is known");
        return;
    };

    let mut updated = toml_config.clone();
    updated.spotify.refresh_token = Some(new_token.to_string());

    match write_toml_config(&updated, path) {
        Ok(()) => info!("Rotated Spotify refresh token saved to {}", path.display()),
        Err(e) => warn!("Failed to save rotated Spotify refresh token: {}", e),
    }
}
