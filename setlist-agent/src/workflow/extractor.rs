//! Intent Extractor
//!
//! Asks the language model to call `extract_query_details` on the user's
//! text and merges the returned arguments into the state. A reply without a
//! function call leaves the state as it was.

use super::{SkipReason, Stage, StageKind, StageOutcome};
use crate::error::{PipelineError, PipelineResult};
use crate::services::{Completion, CompletionService, FunctionSpec};
use crate::types::{Extraction, RequestState};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const EXTRACTION_FUNCTION_NAME: &str = "extract_query_details";

/// Schema the model fills in; only `intent` is required
pub fn extraction_function() -> FunctionSpec {
    FunctionSpec {
        name: EXTRACTION_FUNCTION_NAME.to_string(),
        description: "Extract structured details from a user's playlist request.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": "string",
                    "enum": ["find_songs", "create_playlist"],
                    "description": "User's intent"
                },
                "playlist_name": {"type": "string", "description": "Playlist name"},
                "song_name": {"type": "string", "description": "Song name"},
                "artist_name": {"type": "string", "description": "Artist name"},
                "num_songs": {"type": "integer", "description": "Number of songs"},
                "mood": {"type": "string", "description": "Mood or energy level"}
            },
            "required": ["intent"]
        }),
    }
}

pub struct IntentExtractor {
    completion: Arc<dyn CompletionService>,
    function: FunctionSpec,
}

impl IntentExtractor {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            function: extraction_function(),
        }
    }
}

#[async_trait]
impl Stage for IntentExtractor {
    fn kind(&self) -> StageKind {
        StageKind::Extracting
    }

    async fn run(&self, mut state: RequestState) -> PipelineResult<StageOutcome> {
        let completion = self
            .completion
            .complete_with_function(state.user_input(), &self.function)
            .await
            .map_err(|e| PipelineError::remote(StageKind::Extracting, e))?;

        let (name, arguments) = match completion {
            Completion::FunctionCall { name, arguments } => (name, arguments),
            Completion::Text(text) => {
                info!("No function call in model reply");
                debug!(reply = %text, "Model text reply");
                return Ok(StageOutcome::skipped(state, SkipReason::NoFunctionCall));
            }
        };

        if name != EXTRACTION_FUNCTION_NAME {
            warn!(function = %name, "Model called an unexpected function name; parsing arguments anyway");
        }

        let extraction = Extraction::from_arguments(&arguments)
            .map_err(|source| PipelineError::MalformedArguments { arguments: arguments.clone(), source })?;

        info!(intent = ?extraction.intent, "Function call successful");
        debug!(arguments = %arguments, "Extracted query details");

        state.merge(extraction);
        Ok(StageOutcome::Advanced(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_only_intent() {
        let spec = extraction_function();
        assert_eq!(spec.name, "extract_query_details");
        assert_eq!(spec.parameters["required"], json!(["intent"]));
        assert_eq!(
            spec.parameters["properties"]["intent"]["enum"],
            json!(["find_songs", "create_playlist"])
        );
        assert_eq!(spec.parameters["properties"]["num_songs"]["type"], "integer");
    }
}
