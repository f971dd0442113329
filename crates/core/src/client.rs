use crate::types::GenerationRequest;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Closed classification of completion failures. Only [`RateLimited`] is
/// retryable; everything else indicates a non-transient problem.
///
/// [`RateLimited`]: CompletionError::RateLimited
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("no API credential configured; set {0}")]
    MissingCredential(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid API credential")]
    Auth,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("provider temporarily unavailable")]
    ProviderUnavailable,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

/// Seam between the pipeline and the completion provider.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issues one completion request and returns the raw text of the first
    /// choice. Performs no retries of its own.
    async fn complete(&self, req: &GenerationRequest) -> Result<String, CompletionError>;
}

#[async_trait]
impl<T> CompletionBackend for Box<T>
where
    T: CompletionBackend + ?Sized,
{
    async fn complete(&self, req: &GenerationRequest) -> Result<String, CompletionError> {
        (**self).complete(req).await
    }
}

#[async_trait]
impl<T> CompletionBackend for Arc<T>
where
    T: CompletionBackend + ?Sized,
{
    async fn complete(&self, req: &GenerationRequest) -> Result<String, CompletionError> {
        (**self).complete(req).await
    }
}

/// Chat-completions client for OpenAI-compatible endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    pub endpoint: String,
    pub api_key_env_var: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(endpoint: String, api_key_env_var: String) -> Self {
        Self {
            endpoint,
            api_key_env_var,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, req: &GenerationRequest) -> Result<String, CompletionError> {
        let key = resolve_credential(&self.api_key_env_var, |k| std::env::var(k).ok())?;

        let payload = ChatRequestBody {
            model: req.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: req.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: req.user_prompt.clone(),
                },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.json::<Value>().await.ok().and_then(|value| {
                value
                    .get("error")?
                    .get("message")?
                    .as_str()
                    .map(ToString::to_string)
            });
            return Err(classify_status(status.as_u16(), detail));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        value
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|first| first.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| {
                CompletionError::MalformedResponse(
                    "missing choices[0].message.content in provider response".to_string(),
                )
            })
    }
}

/// Maps a non-2xx HTTP status onto the error taxonomy. 401, 429 and 500 have
/// fixed meanings; any other status becomes [`CompletionError::RequestFailed`]
/// carrying the provider's message when one was present.
fn classify_status(status: u16, detail: Option<String>) -> CompletionError {
    match status {
        401 => CompletionError::Auth,
        429 => CompletionError::RateLimited,
        500 => CompletionError::ProviderUnavailable,
        code => CompletionError::RequestFailed(
            detail.unwrap_or_else(|| format!("http status {code} from provider")),
        ),
    }
}

fn resolve_credential<F>(var: &str, env_get: F) -> Result<String, CompletionError>
where
    F: Fn(&str) -> Option<String>,
{
    env_get(var)
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| CompletionError::MissingCredential(var.to_string()))
}

/// Retry wrapper around [`CompletionBackend::complete`].
///
/// Retries only on [`CompletionError::RateLimited`]; the delay before retry
/// *n* (0-indexed) is 250ms x 3^n. Every other error kind propagates
/// immediately. After `max_retries` retries the last rate-limit error is
/// surfaced unchanged.
pub async fn complete_with_retry<B>(
    backend: &B,
    req: &GenerationRequest,
    max_retries: u32,
) -> Result<String, CompletionError>
where
    B: CompletionBackend + ?Sized,
{
    let mut attempt = 0;
    loop {
        match backend.complete(req).await {
            Err(CompletionError::RateLimited) if attempt < max_retries => {
                let delay = Duration::from_millis(250 * 3u64.pow(attempt));
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Backend stand-in returning scripted results, for tests and examples.
#[derive(Debug, Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
}

impl MockBackend {
    /// Replies with the same text on every call.
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            fallback: Some(text.into()),
            ..Self::default()
        }
    }

    /// Replays the given results in order, then fails.
    pub fn scripted(results: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            ..Self::default()
        }
    }

    /// Number of completion calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, _req: &GenerationRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut script) = self.script.lock() {
            if let Some(next) = script.pop_front() {
                return next;
            }
        }
        match &self.fallback {
            Some(text) => Ok(text.clone()),
            None => Err(CompletionError::MalformedResponse(
                "mock script exhausted".to_string(),
            )),
        }
    }
}
