//! Request state threaded through the pipeline
//!
//! A [`RequestState`] is created with only the user's text, augmented by
//! each stage in turn, and dropped once the playlist builder returns.

use serde::{Deserialize, Serialize};
use setlist_common::config::MAX_TRACK_COUNT;

/// What the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FindSongs,
    CreatePlaylist,
}

/// Structured fields pulled out of the user's text by the language model
///
/// Mirrors the `extract_query_details` function schema. Keys the schema
/// does not declare are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Extraction {
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub playlist_name: Option<String>,
    #[serde(default)]
    pub song_name: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub num_songs: Option<i64>,
    #[serde(default)]
    pub mood: Option<String>,
}

impl Extraction {
    /// Parse function-call arguments
    pub fn from_arguments(arguments: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(arguments)
    }
}

/// The single record handed from stage to stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestState {
    user_input: String,
    pub intent: Option<Intent>,
    pub playlist_name: Option<String>,
    pub song_name: Option<String>,
    pub artist_name: Option<String>,
    pub mood: Option<String>,
    pub num_songs: Option<i64>,
    /// Candidate catalog track ids, written by the recommender and
    /// narrowed by the mood filter
    pub tracks: Vec<String>,
    /// Shareable playlist link, set by the builder
    pub playlist_uri: Option<String>,
}

impl RequestState {
    pub fn new(user_input: impl Into<String>) -> Self {
        Self {
            user_input: user_input.into(),
            intent: None,
            playlist_name: None,
            song_name: None,
            artist_name: None,
            mood: None,
            num_songs: None,
            tracks: Vec::new(),
            playlist_uri: None,
        }
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    /// Overwrite every field the extraction carries; absent fields keep
    /// their current values
    pub fn merge(&mut self, extraction: Extraction) {
        let Extraction {
            intent,
            playlist_name,
            song_name,
            artist_name,
            num_songs,
            mood,
        } = extraction;

        if intent.is_some() {
            self.intent = intent;
        }
        if playlist_name.is_some() {
            self.playlist_name = playlist_name;
        }
        if song_name.is_some() {
            self.song_name = song_name;
        }
        if artist_name.is_some() {
            self.artist_name = artist_name;
        }
        if num_songs.is_some() {
            self.num_songs = num_songs;
        }
        if mood.is_some() {
            self.mood = mood;
        }
    }

    /// Desired track count: `num_songs` when positive, else `default`,
    /// capped at the catalog maximum
    pub fn target_count(&self, default: u32) -> u32 {
        let requested = match self.num_songs {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(MAX_TRACK_COUNT),
            _ => default,
        };
        requested.clamp(1, MAX_TRACK_COUNT)
    }
}

/// Treat blank strings the same as absent ones
pub(crate) fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
