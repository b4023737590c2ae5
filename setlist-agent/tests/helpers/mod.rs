//! Test Helper Utilities
//!
//! In-memory stand-ins for the language model and the catalog service.
//! Both record every call so tests can assert on what the pipeline asked for.

#![allow(dead_code)]

use async_trait::async_trait;
use setlist_agent::services::{
    AudioFeatures, CatalogService, Completion, CompletionService, CreatedPlaylist, FunctionSpec,
    NewPlaylist, TrackSummary, UserProfile,
};
use setlist_agent::ServiceError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Language model that always gives the same reply
pub struct FakeCompletion {
    reply: Mutex<Option<Result<Completion, ServiceError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeCompletion {
    pub fn function_call(arguments: &str) -> Self {
        Self::with_reply(Ok(Completion::FunctionCall {
            name: "extract_query_details".to_string(),
            arguments: arguments.to_string(),
        }))
    }

    pub fn text(content: &str) -> Self {
        Self::with_reply(Ok(Completion::Text(content.to_string())))
    }

    pub fn failing(error: ServiceError) -> Self {
        Self::with_reply(Err(error))
    }

    fn with_reply(reply: Result<Completion, ServiceError>) -> Self {
        Self {
            reply: Mutex::new(Some(reply)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete_with_function(
        &self,
        prompt: &str,
        _function: &FunctionSpec,
    ) -> Result<Completion, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ServiceError::Network("reply already consumed".to_string())))
    }
}

/// Call made against [`FakeCatalog`]
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogCall {
    Search { song: String, artist: String, limit: u32 },
    Recommendations { seed: String, limit: u32 },
    AudioFeatures { ids: Vec<String> },
    CurrentUser,
    CreatePlaylist { user_id: String, playlist: NewPlaylist },
    AddTracks { playlist_id: String, ids: Vec<String> },
}

/// Which catalog operation should fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailOn {
    Search,
    Recommendations,
    AudioFeatures,
    CurrentUser,
    CreatePlaylist,
    AddTracks,
}

/// Scripted catalog
pub struct FakeCatalog {
    pub search_results: Vec<TrackSummary>,
    pub recommended: Vec<TrackSummary>,
    pub energies: HashMap<String, f32>,
    pub fail_on: Option<FailOn>,
    calls: Mutex<Vec<CatalogCall>>,
    playlists_created: Mutex<u32>,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self {
            search_results: Vec::new(),
            recommended: Vec::new(),
            energies: HashMap::new(),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
            playlists_created: Mutex::new(0),
        }
    }
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, id: &str, name: &str) -> Self {
        self.search_results.push(track(id, name));
        self
    }

    pub fn with_recommendations(mut self, ids: &[&str]) -> Self {
        self.recommended = ids.iter().map(|id| track(id, &format!("Track {}", id))).collect();
        self
    }

    pub fn with_energy(mut self, id: &str, energy: f32) -> Self {
        self.energies.insert(id.to_string(), energy);
        self
    }

    pub fn failing_on(mut self, op: FailOn) -> Self {
        self.fail_on = Some(op);
        self
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Ids passed to `add_tracks`, across all calls
    pub fn added_tracks(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::AddTracks { ids, .. } => Some(ids),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn created_playlists(&self) -> Vec<NewPlaylist> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::CreatePlaylist { playlist, .. } => Some(playlist),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: FailOn) -> Result<(), ServiceError> {
        if self.fail_on == Some(op) {
            return Err(ServiceError::Api {
                status: 503,
                message: format!("{:?} unavailable", op),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogService for FakeCatalog {
    async fn search_tracks(
        &self,
        song_name: &str,
        artist_name: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>, ServiceError> {
        self.record(CatalogCall::Search {
            song: song_name.to_string(),
            artist: artist_name.to_string(),
            limit,
        });
        self.check(FailOn::Search)?;
        Ok(self.search_results.iter().take(limit as usize).cloned().collect())
    }

    async fn recommendations(
        &self,
        seed_track_id: &str,
        limit: u32,
    ) -> Result<Vec<TrackSummary>, ServiceError> {
        self.record(CatalogCall::Recommendations {
            seed: seed_track_id.to_string(),
            limit,
        });
        self.check(FailOn::Recommendations)?;
        // Ignores `limit` so callers must enforce it themselves
        Ok(self.recommended.clone())
    }

    async fn audio_features(
        &self,
        track_ids: &[String],
    ) -> Result<Vec<Option<AudioFeatures>>, ServiceError> {
        self.record(CatalogCall::AudioFeatures {
            ids: track_ids.to_vec(),
        });
        self.check(FailOn::AudioFeatures)?;
        Ok(track_ids
            .iter()
            .map(|id| {
                self.energies.get(id).map(|energy| AudioFeatures {
                    id: id.clone(),
                    energy: *energy,
                })
            })
            .collect())
    }

    async fn current_user(&self) -> Result<UserProfile, ServiceError> {
        self.record(CatalogCall::CurrentUser);
        self.check(FailOn::CurrentUser)?;
        Ok(UserProfile {
            id: "test-user".to_string(),
            display_name: Some("Test User".to_string()),
        })
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        playlist: &NewPlaylist,
    ) -> Result<CreatedPlaylist, ServiceError> {
        self.record(CatalogCall::CreatePlaylist {
            user_id: user_id.to_string(),
            playlist: playlist.clone(),
        });
        self.check(FailOn::CreatePlaylist)?;

        let mut created = self.playlists_created.lock().unwrap();
        *created += 1;
        let id = format!("pl{}", *created);
        Ok(CreatedPlaylist {
            url: format!("https://open.spotify.com/playlist/{}", id),
            id,
        })
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), ServiceError> {
        self.record(CatalogCall::AddTracks {
            playlist_id: playlist_id.to_string(),
            ids: track_ids.to_vec(),
        });
        self.check(FailOn::AddTracks)?;
        Ok(())
    }
}

pub fn track(id: &str, name: &str) -> TrackSummary {
    TrackSummary {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
