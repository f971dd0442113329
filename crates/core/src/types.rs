use crate::preview::SandboxPolicy;
use serde::{Deserialize, Serialize};

/// A fully built chat-completion request. Immutable once constructed by
/// [`crate::prompt::PromptBuilder`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub theme: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Name of the environment variable holding the API credential. The
    /// credential itself is read at call time, never stored.
    pub api_key_env_var: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            api_key_env_var: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt. Only rate-limit
    /// failures are ever retried.
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub preview: SandboxPolicy,
}
