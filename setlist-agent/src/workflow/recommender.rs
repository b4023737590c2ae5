//! Song Recommender
//!
//! Finds the best catalog match for the requested song and artist, then
//! uses it as the seed for a similarity query. The recommended ids replace
//! `tracks` in their response order.

use super::{SkipReason, Stage, StageKind, StageOutcome};
use crate::error::{PipelineError, PipelineResult};
use crate::services::CatalogService;
use crate::types::{present, RequestState};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub struct SongRecommender {
    catalog: Arc<dyn CatalogService>,
    default_num_songs: u32,
}

impl SongRecommender {
    pub fn new(catalog: Arc<dyn CatalogService>, default_num_songs: u32) -> Self {
        Self {
            catalog,
            default_num_songs,
        }
    }
}

#[async_trait]
impl Stage for SongRecommender {
    fn kind(&self) -> StageKind {
        StageKind::Recommending
    }

    async fn run(&self, mut state: RequestState) -> PipelineResult<StageOutcome> {
        let Some(song_name) = present(&state.song_name) else {
            return Ok(StageOutcome::skipped(state, SkipReason::MissingField("song_name")));
        };
        let Some(artist_name) = present(&state.artist_name) else {
            return Ok(StageOutcome::skipped(state, SkipReason::MissingField("artist_name")));
        };

        let limit = state.target_count(self.default_num_songs);

        let matches = self
            .catalog
            .search_tracks(song_name, artist_name, 1)
            .await
            .map_err(|e| PipelineError::remote(StageKind::Recommending, e))?;

        let Some(seed) = matches.into_iter().next() else {
            info!(song = %song_name, artist = %artist_name, "No catalog match for seed track");
            return Ok(StageOutcome::skipped(state, SkipReason::NoSearchMatch));
        };

        info!(seed_id = %seed.id, seed_name = %seed.name, "Seed track found");

        let recommended = self
            .catalog
            .recommendations(&seed.id, limit)
            .await
            .map_err(|e| PipelineError::remote(StageKind::Recommending, e))?;

        state.tracks = recommended
            .into_iter()
            .take(limit as usize)
            .map(|track| track.id)
            .collect();

        info!(track_count = state.tracks.len(), limit = limit, "Recommendations received");
        Ok(StageOutcome::Advanced(state))
    }
}
