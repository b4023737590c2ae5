//! Credential resolution for setlist-agent
//!
//! Secrets resolve with ENV → TOML priority. Values are valid when they are
//! non-empty after trimming.

use crate::services::SpotifyAuth;
use setlist_common::config::TomlConfig;
use setlist_common::{Error, Result};
use tracing::{info, warn};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const SPOTIFY_CLIENT_ID_ENV: &str = "SPOTIFY_CLIENT_ID";
/// Accepted alias for the client id variable
pub const SPOTIPY_CLIENT_ID_ENV: &str = "SPOTIPY_CLIENT_ID";
pub const SPOTIFY_CLIENT_SECRET_ENV: &str = "SPOTIFY_CLIENT_SECRET";
/// Accepted alias for the client secret variable
pub const CLIENT_SECRET_ENV: &str = "CLIENT_SECRET";
pub const SPOTIFY_ACCESS_TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";
pub const SPOTIFY_REFRESH_TOKEN_ENV: &str = "SPOTIFY_REFRESH_TOKEN";

/// Validate secret (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve one secret from the given env variables, then the TOML value
///
/// Returns the value and the name of the source it came from.
fn resolve_secret(
    label: &str,
    env_vars: &[&str],
    toml_value: Option<&String>,
) -> Option<(String, &'static str)> {
    let env_value = env_vars
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!("{} found in both environment and TOML config. Using environment.", label);
    }

    if let Some(value) = env_value {
        return Some((value.trim().to_string(), "environment"));
    }

    toml_value.map(|v| (v.trim().to_string(), "TOML"))
}

/// Resolve the OpenAI API key
pub fn resolve_openai_api_key(toml_config: &TomlConfig) -> Result<String> {
    match resolve_secret(
        "OpenAI API key",
        &[OPENAI_API_KEY_ENV],
        toml_config.openai.api_key.as_ref(),
    ) {
        Some((key, source)) => {
            info!("OpenAI API key loaded from {}", source);
            Ok(key)
        }
        None => Err(Error::Config(
            "OpenAI API key not configured. Please configure using one of:\n\
             1. Environment: OPENAI_API_KEY=your-key-here\n\
             2. TOML config: [openai] api_key = \"your-key\""
                .to_string(),
        )),
    }
}

/// Resolve how to authenticate against Spotify
///
/// A ready access token wins; otherwise a refresh token plus client id and
/// secret are required.
pub fn resolve_spotify_auth(toml_config: &TomlConfig) -> Result<SpotifyAuth> {
    let spotify = &toml_config.spotify;

    if let Some((token, source)) = resolve_secret(
        "Spotify access token",
        &[SPOTIFY_ACCESS_TOKEN_ENV],
        spotify.access_token.as_ref(),
    ) {
        info!("Spotify access token loaded from {}", source);
        return Ok(SpotifyAuth::AccessToken(token));
    }

    let client_id = resolve_secret(
        "Spotify client id",
        &[SPOTIFY_CLIENT_ID_ENV, SPOTIPY_CLIENT_ID_ENV],
        spotify.client_id.as_ref(),
    );
    let client_secret = resolve_secret(
        "Spotify client secret",
        &[SPOTIFY_CLIENT_SECRET_ENV, CLIENT_SECRET_ENV],
        spotify.client_secret.as_ref(),
    );
    let refresh_token = resolve_secret(
        "Spotify refresh token",
        &[SPOTIFY_REFRESH_TOKEN_ENV],
        spotify.refresh_token.as_ref(),
    );

    match (client_id, client_secret, refresh_token) {
        (Some((client_id, _)), Some((client_secret, _)), Some((refresh_token, source))) => {
            info!("Spotify refresh token loaded from {}", source);
            Ok(SpotifyAuth::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            })
        }
        (client_id, client_secret, refresh_token) => {
            let mut missing = Vec::new();
            if client_id.is_none() {
                missing.push("client id");
            }
            if client_secret.is_none() {
                missing.push("client secret");
            }
            if refresh_token.is_none() {
                missing.push("refresh token");
            }

            Err(Error::Config(format!(
                "Spotify credentials not configured (missing {}). Please configure using one of:\n\
                 1. Environment (or .env): SPOTIFY_ACCESS_TOKEN=token, or SPOTIFY_CLIENT_ID + \
                 SPOTIFY_CLIENT_SECRET + SPOTIFY_REFRESH_TOKEN \
                 (SPOTIPY_CLIENT_ID and CLIENT_SECRET are also accepted)\n\
                 2. TOML config: [spotify] access_token, or client_id + client_secret + refresh_token",
                missing.join(", ")
            )))
        }
    }
}
