//! Pipeline Orchestrator
//!
//! Runs Extracting → Recommending → Filtering → Building exactly once per
//! request, strictly in order, one stage at a time.
//!
//! # Error Handling
//! - Skipped stages are recorded and the run continues
//! - The first stage error aborts the run; nothing already done on the
//!   catalog service is rolled back
//!
//! # Example
//! ```rust,ignore
//! let pipeline = Pipeline::new(completion, catalog, PipelineConfig::default());
//! let report = pipeline.run("Create a playlist called This works.").await?;
//! println!("{:?}", report.state.playlist_uri);
//! ```

use super::{
    IntentExtractor, MoodFilter, PipelineEvent, PlaylistBuilder, SkipReason, SongRecommender,
    Stage, StageKind,
};
use crate::error::PipelineResult;
use crate::services::{CatalogService, CompletionService};
use crate::types::RequestState;
use serde::Serialize;
use setlist_common::config::PipelineConfig;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// What happened at one stage of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub stage: StageKind,
    pub advanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

/// Final state of a successful run plus a per-stage trace
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub state: RequestState,
    pub steps: Vec<StepRecord>,
}

impl PipelineReport {
    pub fn playlist_uri(&self) -> Option<&str> {
        self.state.playlist_uri.as_deref()
    }
}

/// Linear four-stage pipeline
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    event_tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl Pipeline {
    /// Wire the four stages around the shared service clients
    pub fn new(
        completion: Arc<dyn CompletionService>,
        catalog: Arc<dyn CatalogService>,
        config: PipelineConfig,
    ) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(IntentExtractor::new(completion)),
            Box::new(SongRecommender::new(catalog.clone(), config.default_num_songs)),
            Box::new(MoodFilter::new(catalog.clone(), config.energy_threshold)),
            Box::new(PlaylistBuilder::new(catalog)),
        ];

        Self {
            stages,
            event_tx: None,
        }
    }

    /// Report progress on `event_tx` while running
    pub fn with_events(mut self, event_tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Stage order this pipeline executes
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind()).collect()
    }

    /// Process one request from raw text to created playlist
    pub async fn run(&self, user_input: impl Into<String>) -> PipelineResult<PipelineReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline", run_id = %run_id);
        self.run_stages(run_id, RequestState::new(user_input))
            .instrument(span)
            .await
    }

    async fn run_stages(&self, run_id: Uuid, mut state: RequestState) -> PipelineResult<PipelineReport> {
        info!("Pipeline run started");
        self.emit_event(PipelineEvent::RunStarted {
            run_id,
            timestamp: chrono::Utc::now().timestamp(),
        })
        .await;

        let mut steps = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let kind = stage.kind();
            debug!(stage = %kind, "Stage started");
            self.emit_event(PipelineEvent::StageStarted { stage: kind }).await;

            let outcome = match stage.run(state).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(stage = %kind, kind = ?e.kind(), "Pipeline aborted: {}", e);
                    self.emit_event(PipelineEvent::RunFailed {
                        run_id,
                        stage: Some(kind),
                        kind: e.kind(),
                        message: e.to_string(),
                    })
                    .await;
                    return Err(e);
                }
            };

            let reason = outcome.skip_reason().cloned();
            match &reason {
                Some(reason) => info!(stage = %kind, reason = %reason, "Stage skipped"),
                None => debug!(stage = %kind, "Stage advanced"),
            }

            self.emit_event(PipelineEvent::StageCompleted {
                stage: kind,
                advanced: reason.is_none(),
                reason: reason.clone(),
            })
            .await;

            steps.push(StepRecord {
                stage: kind,
                advanced: reason.is_none(),
                reason,
            });
            state = outcome.into_state();
        }

        info!(
            playlist_uri = state.playlist_uri.as_deref().unwrap_or("none"),
            track_count = state.tracks.len(),
            "Pipeline run complete"
        );

        self.emit_event(PipelineEvent::RunCompleted {
            run_id,
            playlist_uri: state.playlist_uri.clone(),
            timestamp: chrono::Utc::now().timestamp(),
        })
        .await;

        Ok(PipelineReport { run_id, state, steps })
    }

    async fn emit_event(&self, event: PipelineEvent) {
        if let Some(tx) = &self.event_tx {
            // Receiver may have gone away; progress reporting is best-effort
            let _ = tx.send(event).await;
        }
    }
}
