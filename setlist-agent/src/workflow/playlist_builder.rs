//! Playlist Builder
//!
//! Creates a private playlist for the authenticated user and adds the
//! candidate tracks in order. A playlist is created on every run, even
//! when there are no tracks to add.

use super::{Stage, StageKind, StageOutcome};
use crate::error::{PipelineError, PipelineResult};
use crate::services::{CatalogService, NewPlaylist};
use crate::types::{present, RequestState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct PlaylistBuilder {
    catalog: Arc<dyn CatalogService>,
}

impl PlaylistBuilder {
    pub fn new(catalog: Arc<dyn CatalogService>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Stage for PlaylistBuilder {
    fn kind(&self) -> StageKind {
        StageKind::Building
    }

    async fn run(&self, mut state: RequestState) -> PipelineResult<StageOutcome> {
        if present(&state.playlist_name).is_none() {
            return Err(PipelineError::MissingPlaylistName);
        }
        let name = state.playlist_name.clone().unwrap_or_default();

        let user = self
            .catalog
            .current_user()
            .await
            .map_err(|e| PipelineError::remote(StageKind::Building, e))?;

        let playlist = self
            .catalog
            .create_playlist(&user.id, &NewPlaylist::private(name.as_str()))
            .await
            .map_err(|e| PipelineError::remote(StageKind::Building, e))?;

        info!(playlist_id = %playlist.id, name = %name, user_id = %user.id, "Playlist created");

        if !state.tracks.is_empty() {
            self.catalog
                .add_tracks(&playlist.id, &state.tracks)
                .await
                .map_err(|e| PipelineError::remote(StageKind::Building, e))?;

            info!(playlist_id = %playlist.id, track_count = state.tracks.len(), "Tracks added");
        }

        state.playlist_uri = Some(playlist.url);
        Ok(StageOutcome::Advanced(state))
    }
}
