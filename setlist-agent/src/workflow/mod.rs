//! Playlist request workflow
//!
//! Implements the fixed, linear four-stage pipeline:
//! - **Extracting**: language model turns free text into structured fields
//! - **Recommending**: seed-track search + similarity recommendations
//! - **Filtering**: keep candidates whose energy meets the threshold
//! - **Building**: create the playlist and add the surviving tracks
//!
//! # Architecture
//!
//! Every stage receives the [`RequestState`] by value and hands it back
//! inside a [`StageOutcome`]. A stage whose inputs are missing returns
//! [`StageOutcome::Skipped`] with the state untouched; only remote failures,
//! malformed responses and a missing playlist name abort the run.

pub mod extractor;
pub mod mood_filter;
pub mod pipeline;
pub mod playlist_builder;
pub mod recommender;

pub use extractor::{extraction_function, IntentExtractor};
pub use mood_filter::MoodFilter;
pub use pipeline::{Pipeline, PipelineReport, StepRecord};
pub use playlist_builder::PlaylistBuilder;
pub use recommender::SongRecommender;

use crate::error::{ErrorKind, PipelineResult};
use crate::types::RequestState;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// Pipeline position, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Extracting,
    Recommending,
    Filtering,
    Building,
}

impl StageKind {
    /// All stages in the order they run
    pub const ORDER: [StageKind; 4] = [
        StageKind::Extracting,
        StageKind::Recommending,
        StageKind::Filtering,
        StageKind::Building,
    ];
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Extracting => "extract_intent",
            StageKind::Recommending => "get_similar_songs",
            StageKind::Filtering => "filter_songs",
            StageKind::Building => "create_playlist",
        };
        f.write_str(name)
    }
}

/// Why a stage passed the state through unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "field", rename_all = "snake_case")]
pub enum SkipReason {
    /// The model answered without calling the extraction function
    NoFunctionCall,
    /// A required state field was absent or blank
    MissingField(&'static str),
    /// The seed-track search returned no matches
    NoSearchMatch,
    /// There were no candidate tracks to filter
    NoCandidates,
}

impl SkipReason {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SkipReason::MissingField(_) => ErrorKind::Precondition,
            SkipReason::NoFunctionCall | SkipReason::NoSearchMatch | SkipReason::NoCandidates => {
                ErrorKind::EmptyResult
            }
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoFunctionCall => f.write_str("no function call"),
            SkipReason::MissingField(field) => write!(f, "missing {}", field),
            SkipReason::NoSearchMatch => f.write_str("no search match"),
            SkipReason::NoCandidates => f.write_str("no candidate tracks"),
        }
    }
}

/// Result of running one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// The stage augmented the state
    Advanced(RequestState),
    /// The stage made no change
    Skipped {
        state: RequestState,
        reason: SkipReason,
    },
}

impl StageOutcome {
    pub fn skipped(state: RequestState, reason: SkipReason) -> Self {
        StageOutcome::Skipped { state, reason }
    }

    pub fn state(&self) -> &RequestState {
        match self {
            StageOutcome::Advanced(state) | StageOutcome::Skipped { state, .. } => state,
        }
    }

    pub fn into_state(self) -> RequestState {
        match self {
            StageOutcome::Advanced(state) | StageOutcome::Skipped { state, .. } => state,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            StageOutcome::Advanced(_) => None,
            StageOutcome::Skipped { reason, .. } => Some(reason),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageOutcome::Skipped { .. })
    }
}

/// One pipeline step
#[async_trait]
pub trait Stage: Send + Sync {
    fn kind(&self) -> StageKind;

    /// Consume the state and hand it back, augmented or unchanged
    async fn run(&self, state: RequestState) -> PipelineResult<StageOutcome>;
}

/// Progress events emitted while a pipeline run executes
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    RunStarted {
        run_id: uuid::Uuid,
        /// Unix timestamp (seconds since epoch)
        timestamp: i64,
    },
    StageStarted {
        stage: StageKind,
    },
    StageCompleted {
        stage: StageKind,
        /// False when the stage passed the state through unchanged
        advanced: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<SkipReason>,
    },
    RunCompleted {
        run_id: uuid::Uuid,
        playlist_uri: Option<String>,
        timestamp: i64,
    },
    RunFailed {
        run_id: uuid::Uuid,
        stage: Option<StageKind>,
        kind: ErrorKind,
        message: String,
    },
}
