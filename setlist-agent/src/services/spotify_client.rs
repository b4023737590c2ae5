//! Spotify Web API client
//!
//! Covers the catalog reads (search, recommendations, audio features) and
//! the playlist writes (current user, create playlist, add items) the
//! pipeline needs. Requests are throttled client-side; failures are
//! reported, never retried.
//!
//! # API Reference
//! - Base URL: https://api.spotify.com/v1
//! - Documentation: https://developer.spotify.com/documentation/web-api

use super::{
    error_from_response, AudioFeatures, CatalogService, CreatedPlaylist, NewPlaylist,
    TrackSummary, UserProfile,
};
use crate::error::ServiceError;
use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use setlist_common::config::SpotifyConfig;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::debug;

/// Maximum ids per audio-features request and per add-items request
const MAX_IDS_PER_REQUEST: usize = 100;

const TRACK_URI_PREFIX: &str = "spotify:track:";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Paging<TrackSummary>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    tracks: Vec<TrackSummary>,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistResponse {
    id: String,
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: String,
}

#[derive(Debug, Serialize)]
struct AddItemsRequest<'a> {
    uris: &'a [String],
}

/// Spotify Web API client
pub struct SpotifyClient {
    http_client: Client,
    access_token: String,
    base_url: Url,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig, access_token: String) -> Result<Self, ServiceError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            ServiceError::Network(format!("Invalid Spotify API URL {}: {}", config.api_base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::Network(format!(
                "Invalid Spotify API URL {}: not a base URL",
                config.api_base_url
            )));
        }

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            access_token,
            base_url,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Throttle, authorize, send, and decode a JSON response
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(format!("Failed to parse Spotify response: {}", e)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ServiceError> {
        self.rate_limiter.until_ready().await;

        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("Spotify request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response)
    }
}

/// `spotify:track:<id>` for bare ids; URIs pass through unchanged
pub fn track_uri(track_id: &str) -> String {
    if track_id.starts_with(TRACK_URI_PREFIX) {
        track_id.to_string()
    } else {
        format!("{}{}", TRACK_URI_PREFIX, track_id)
    }
}

#[async_trait]
impl CatalogService for SpotifyClient {
    async fn search_tracks(
        &self,
        song_name: &str,
        artist_name: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>, ServiceError> {
        let query = format!("track:{} artist:{}", song_name, artist_name);
        debug!(query = %query, limit = limit, "Searching Spotify tracks");

        let limit = limit.to_string();
        let request = self.http_client.get(self.url(&["search"])).query(&[
            ("q", query.as_str()),
            ("type", "track"),
            ("limit", limit.as_str()),
        ]);

        let response: SearchResponse = self.send_json(request).await?;
        Ok(response.tracks.items)
    }

    async fn recommendations(
        &self,
        seed_track_id: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>, ServiceError> {
        debug!(seed = %seed_track_id, limit = limit, "Requesting Spotify recommendations");

        let limit = limit.to_string();
        let request = self.http_client.get(self.url(&["recommendations"])).query(&[
            ("seed_tracks", seed_track_id),
            ("limit", limit.as_str()),
        ]);

        let response: RecommendationsResponse = self.send_json(request).await?;
        Ok(response.tracks)
    }

    async fn audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, ServiceError> {
        let mut features = Vec::with_capacity(track_ids.len());

        for chunk in track_ids.chunks(MAX_IDS_PER_REQUEST) {
            debug!(count = chunk.len(), "Fetching Spotify audio features");

            let ids = chunk.join(",");
            let request = self
                .http_client
                .get(self.url(&["audio-features"]))
                .query(&[("ids", ids.as_str())]);

            let response: AudioFeaturesResponse = self.send_json(request).await?;
            features.extend(response.audio_features);
        }

        Ok(features)
    }

    async fn current_user(&self) -> Result<UserProfile, ServiceError> {
        let request = self.http_client.get(self.url(&["me"]));
        self.send_json(request).await
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<CreatedPlaylist, ServiceError> {
        debug!(user_id = %user_id, name = %playlist.name, "Creating Spotify playlist");

        let request = self
            .http_client
            .post(self.url(&["users", user_id, "playlists"]))
            .json(playlist);

        let response: PlaylistResponse = self.send_json(request).await?;
        Ok(CreatedPlaylist {
            id: response.id,
            url: response.external_urls.spotify,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ServiceError> {
        let uris: Vec<String> = track_ids.iter().map(|id| track_uri(id)).collect();

        for chunk in uris.chunks(MAX_IDS_PER_REQUEST) {
            debug!(playlist_id = %playlist_id, count = chunk.len(), "Adding tracks to playlist");

            let request = self
                .http_client
                .post(self.url(&["playlists", playlist_id, "tracks"]))
                .json(&AddItemsRequest { uris: chunk });

            self.send(request).await?;
        }

        Ok(())
    }
}
