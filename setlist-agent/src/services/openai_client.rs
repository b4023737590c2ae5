//! OpenAI chat completion client
//!
//! Sends a single user message together with one function tool and reports
//! whether the model called it.
//!
//! # API Reference
//! - Endpoint: `{base_url}/chat/completions`
//! - Documentation: https://platform.openai.com/docs/api-reference/chat

use super::{error_from_response, Completion, CompletionService, FunctionSpec};
use crate::error::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use setlist_common::config::OpenAiConfig;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: &'a FunctionSpec,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
    /// Legacy single function call field
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

/// OpenAI API client
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    model: String,
    temperature: f32,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, api_key: String) -> Result<Self, ServiceError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete_with_function(
        &self,
        prompt: &str,
        function: &FunctionSpec,
    ) -> Result<Completion, ServiceError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            tools: vec![Tool {
                tool_type: "function",
                function,
            }],
            tool_choice: "auto",
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, function = %function.name, "Requesting chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Parse(format!("Failed to parse chat completion: {}", e)))?;

        let Some(choice) = chat.choices.into_iter().next() else {
            return Err(ServiceError::Parse("Chat completion has no choices".to_string()));
        };

        let message = choice.message;
        let call = message
            .tool_calls
            .and_then(|calls| calls.into_iter().next())
            .map(|tc| tc.function)
            .or(message.function_call);

        Ok(match call {
            Some(FunctionCall { name, arguments }) => Completion::FunctionCall { name, arguments },
            None => Completion::Text(message.content.unwrap_or_default()),
        })
    }
}
