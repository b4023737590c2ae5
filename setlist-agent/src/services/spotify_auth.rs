//! Spotify session provider
//!
//! Produces the bearer token used by [`super::SpotifyClient`]. Either a
//! ready access token is supplied directly, or a refresh token from an
//! earlier authorization code grant is exchanged once at startup.
//!
//! # API Reference
//! - Endpoint: `{accounts_url}/api/token`
//! - Documentation: https://developer.spotify.com/documentation/web-api/tutorials/refreshing-tokens

use super::error_from_response;
use crate::error::ServiceError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Authorization scope the refresh token must have been granted
pub const SPOTIFY_SCOPES: &str =
    "playlist-modify-public playlist-modify-private playlist-read-private";

/// How to obtain a Spotify access token
#[derive(Clone)]
pub enum SpotifyAuth {
    /// Pre-obtained user access token
    AccessToken(String),
    /// Exchange a refresh token with client credentials
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

impl std::fmt::Debug for SpotifyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpotifyAuth::AccessToken(_) => f.write_str("SpotifyAuth::AccessToken(..)"),
            SpotifyAuth::RefreshToken { client_id, .. } => f
                .debug_struct("SpotifyAuth::RefreshToken")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Result of a successful authorization
#[derive(Debug, Clone, PartialEq)]
pub struct AccessGrant {
    pub access_token: String,
    /// New refresh token when the accounts service rotated it
    pub rotated_refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl SpotifyAuth {
    /// Resolve an access token
    pub async fn authorize(
        &self,
        accounts_url: &str,
        timeout: Duration,
    ) -> Result<AccessGrant, ServiceError> {
        let (client_id, client_secret, refresh_token) = match self {
            SpotifyAuth::AccessToken(token) => {
                info!("Using pre-obtained Spotify access token");
                return Ok(AccessGrant {
                    access_token: token.clone(),
                    rotated_refresh_token: None,
                    scope: None,
                    expires_in: None,
                });
            }
            SpotifyAuth::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
            } => (client_id, client_secret, refresh_token),
        };

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let url = format!("{}/api/token", accounts_url.trim_end_matches('/'));
        let credentials = STANDARD.encode(format!("{}:{}", client_id, client_secret));

        debug!(url = %url, "Exchanging Spotify refresh token");

        let response = http_client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {}", credentials))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(format!("Failed to parse token response: {}", e)))?;

        let rotated_refresh_token = token
            .refresh_token
            .filter(|new_token| new_token != refresh_token);

        info!(
            scope = token.scope.as_deref().unwrap_or("unknown"),
            expires_in = token.expires_in,
            rotated = rotated_refresh_token.is_some(),
            "Spotify access token obtained"
        );

        Ok(AccessGrant {
            access_token: token.access_token,
            rotated_refresh_token,
            scope: token.scope,
            expires_in: token.expires_in,
        })
    }
}
