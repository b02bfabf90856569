pub mod providers;

use crate::config::LlmConfig;
use async_trait::async_trait;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    ResponseError(String),
    ConfigError(String),
    /// The service answered but the completion field was absent.
    CompletionMissing,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "LLM connection error: {}", msg),
            LlmError::ResponseError(msg) => write!(f, "LLM response error: {}", msg),
            LlmError::ConfigError(msg) => write!(f, "LLM configuration error: {}", msg),
            LlmError::CompletionMissing => {
                write!(f, "LLM response carried no completion text")
            }
        }
    }
}

impl Error for LlmError {}

/// Seam over the hosted text-completion endpoint. Takes the assembled
/// prompt, returns the raw completion text.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

pub struct LlmManager {
    completer: Box<dyn TextCompleter + Send + Sync>,
}

impl LlmManager {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let completer: Box<dyn TextCompleter + Send + Sync> = match config.backend.as_str() {
            "bedrock" => Box::new(providers::bedrock::BedrockProvider::new(config)?),
            _ => {
                return Err(LlmError::ConfigError(format!(
                    "Unsupported LLM backend: {}",
                    config.backend
                )));
            }
        };

        Ok(Self { completer })
    }
}

#[async_trait]
impl TextCompleter for LlmManager {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.completer.complete(prompt).await
    }
}
