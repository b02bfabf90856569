use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmConfig;
use crate::llm::{LlmError, TextCompleter};

const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
const STOP_SEQUENCE: &str = "\n\nHuman:";

/// Client for a Bedrock-style model invocation endpoint. Blocking
/// single-shot calls, no streaming.
pub struct BedrockProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
}

#[derive(Serialize, Deserialize)]
struct InvokeRequest {
    prompt: String,
    max_tokens_to_sample: u32,
    temperature: f32,
    top_k: u32,
    top_p: f32,
    stop_sequences: Vec<String>,
    anthropic_version: String,
}

#[derive(Deserialize)]
struct InvokeResponse {
    completion: Option<String>,
    #[serde(flatten)]
    _extra: std::collections::HashMap<String, serde_json::Value>,
}

impl BedrockProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_url = config.api_url.clone().ok_or_else(|| {
            LlmError::ConfigError("API URL is required for the bedrock backend".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            api_url,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens_to_sample: config.max_tokens_to_sample,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
        })
    }

    /// Wraps the prompt in the conversational template the model expects.
    fn wrap_prompt(prompt: &str) -> String {
        format!("Human: {}\n\n\nAssistant:", prompt)
    }

    /// Builds the request body. Serialization handles all escaping, so
    /// quotes and backslashes in the prompt survive the round trip intact.
    fn build_request(&self, prompt: &str) -> InvokeRequest {
        InvokeRequest {
            prompt: Self::wrap_prompt(prompt),
            max_tokens_to_sample: self.max_tokens_to_sample,
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            stop_sequences: vec![STOP_SEQUENCE.to_string()],
            anthropic_version: ANTHROPIC_VERSION.to_string(),
        }
    }

    fn extract_completion(body: &str) -> Result<String, LlmError> {
        let response: InvokeResponse = serde_json::from_str(body).map_err(|e| {
            LlmError::ResponseError(format!("failed to parse model response: {}", e))
        })?;
        response.completion.ok_or(LlmError::CompletionMissing)
    }
}

#[async_trait]
impl TextCompleter for BedrockProvider {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = self.build_request(prompt);
        let url = format!("{}/model/{}/invoke", self.api_url, self.model);
        debug!("invoking model {} at {}", self.model, self.api_url);

        let mut http_request = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| LlmError::ConnectionError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::ResponseError(format!(
                "model endpoint responded with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::ResponseError(e.to_string()))?;

        Self::extract_completion(&body)
    }
}
