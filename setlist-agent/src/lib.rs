//! setlist-agent library interface
//!
//! Maps a natural-language playlist request to calls against the OpenAI and
//! Spotify APIs through a fixed four-stage pipeline.

pub mod config;
pub mod error;
pub mod services;
pub mod types;
pub mod workflow;

pub use crate::error::{ErrorKind, PipelineError, PipelineResult, ServiceError};
pub use crate::types::{Extraction, Intent, RequestState};
pub use crate::workflow::{Pipeline, PipelineEvent, PipelineReport, StageKind, StageOutcome};
