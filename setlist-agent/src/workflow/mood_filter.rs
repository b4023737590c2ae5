//! Mood Filter
//!
//! Narrows `tracks` to candidates whose energy meets the threshold.
//! Tracks without audio features are dropped. Relative order is kept.

use super::{SkipReason, Stage, StageKind, StageOutcome};
use crate::error::{PipelineError, PipelineResult};
use crate::services::{AudioFeatures, CatalogService};
use crate::types::{present, RequestState};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

pub struct MoodFilter {
    catalog: Arc<dyn CatalogService>,
    energy_threshold: f32,
}

impl MoodFilter {
    pub fn new(catalog: Arc<dyn CatalogService>, energy_threshold: f32) -> Self {
        Self {
            catalog,
            energy_threshold,
        }
    }
}

/// Keep ids whose feature energy is at or above `threshold`
///
/// Features are matched to candidates by id, so a response that omits or
/// reorders entries cannot shift energies onto the wrong track.
pub fn retain_energetic(
    candidates: &[String],
    features: Vec<Option<AudioFeatures>>,
    threshold: f32,
) -> Vec<String> {
    let energy_by_id: HashMap<String, f32> = features
        .into_iter()
        .flatten()
        .map(|f| (f.id, f.energy))
        .collect();

    candidates
        .iter()
        .filter(|id| {
            energy_by_id
                .get(id.as_str())
                .is_some_and(|energy| *energy >= threshold)
        })
        .cloned()
        .collect()
}

#[async_trait]
impl Stage for MoodFilter {
    fn kind(&self) -> StageKind {
        StageKind::Filtering
    }

    async fn run(&self, mut state: RequestState) -> PipelineResult<StageOutcome> {
        if present(&state.song_name).is_none() {
            return Ok(StageOutcome::skipped(state, SkipReason::MissingField("song_name")));
        }
        if present(&state.mood).is_none() {
            return Ok(StageOutcome::skipped(state, SkipReason::MissingField("mood")));
        }
        if state.tracks.is_empty() {
            return Ok(StageOutcome::skipped(state, SkipReason::NoCandidates));
        }

        let features = self
            .catalog
            .audio_features(&state.tracks)
            .await
            .map_err(|e| PipelineError::remote(StageKind::Filtering, e))?;

        let before = state.tracks.len();
        state.tracks = retain_energetic(&state.tracks, features, self.energy_threshold);

        debug!(mood = ?state.mood, threshold = self.energy_threshold, "Applied energy filter");
        info!(kept = state.tracks.len(), dropped = before - state.tracks.len(), "Mood filter complete");

        Ok(StageOutcome::Advanced(state))
    }
}
