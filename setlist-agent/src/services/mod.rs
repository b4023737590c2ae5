//! Remote collaborators used by the pipeline stages
//!
//! Stages depend only on the [`CompletionService`] and [`CatalogService`]
//! traits. The concrete clients are built once at startup and shared
//! read-only for the whole run.

pub mod openai_client;
pub mod spotify_auth;
pub mod spotify_client;

pub use openai_client::OpenAiClient;
pub use spotify_auth::{AccessGrant, SpotifyAuth, SPOTIFY_SCOPES};
pub use spotify_client::SpotifyClient;

use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Function declaration offered to the language model
#[derive(Debug, Clone, Serialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

/// Language-model reply
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The model chose to call the declared function
    FunctionCall { name: String, arguments: String },
    /// The model answered in free text
    Text(String),
}

/// Language-model completion service
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send `prompt` with one optional function the model may call
    async fn complete_with_function(
        &self,
        prompt: &str,
        function: &FunctionSpec,
    ) -> Result<Completion, ServiceError>;
}

/// Catalog track as returned by search and recommendations
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackSummary {
    pub id: String,
    pub name: String,
}

/// Per-track audio analysis
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioFeatures {
    pub id: String,
    /// Perceived intensity, 0.0-1.0
    pub energy: f32,
}

/// Authenticated user identity
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Playlist creation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub public: bool,
    pub collaborative: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewPlaylist {
    /// Private, non-collaborative playlist
    pub fn private(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: false,
            collaborative: false,
            description: None,
        }
    }
}

/// Playlist created on the catalog service
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPlaylist {
    pub id: String,
    /// Externally shareable link
    pub url: String,
}

/// Catalog, recommendation and playlist service
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Ranked track matches for a track name + artist name query
    async fn search_tracks(
        &self,
        song_name: &str,
        artist_name: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>, ServiceError>;

    /// Tracks similar to the seed, at most `limit`
    async fn recommendations(
        &self,
        seed_track_id: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>, ServiceError>;

    /// Audio features aligned with `track_ids`; `None` where unavailable
    async fn audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, ServiceError>;

    async fn current_user(&self) -> Result<UserProfile, ServiceError>;

    async fn create_playlist(
        &self,
        user_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<CreatedPlaylist, ServiceError>;

    /// Append tracks to a playlist, preserving order
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ServiceError>;
}

/// Map a non-success HTTP response to a [`ServiceError`]
pub(crate) async fn error_from_response(response: reqwest::Response) -> ServiceError {
    let status = response.status();

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        return ServiceError::RateLimited { retry_after };
    }

    let body = response.text().await.unwrap_or_default();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return ServiceError::Unauthorized(body);
    }

    ServiceError::Api {
        status: status.as_u16(),
        message: body,
    }
}
