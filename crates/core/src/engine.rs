use crate::client::{complete_with_retry, CompletionBackend, CompletionError, OpenAiClient};
use crate::extract::{extract, ExtractionError, GameDocument};
use crate::preview::{PreviewError, PreviewHandle, PreviewSession};
use crate::prompt::PromptBuilder;
use crate::types::{AppConfig, LlmConfig};
use thiserror::Error;

/// Errors surfaced to the collaborator layer by [`Engine::generate`] and
/// friends. Every stage fails fast; nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("theme must not be empty")]
    EmptyTheme,
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("preview failed: {0}")]
    Preview(#[from] PreviewError),
}

/// Orchestrates one generation flow: build prompt, complete with retry,
/// extract, show. Owns the completion backend and the single preview
/// session; `&mut self` on the mutating operations keeps the live handle
/// single-writer.
///
/// Re-entrant generation is not coordinated here: the caller is responsible
/// for disabling its submit trigger while a request is in flight. `show`
/// always reflects the most recently completed extraction.
pub struct Engine<B: CompletionBackend> {
    backend: B,
    llm: LlmConfig,
    max_retries: u32,
    session: PreviewSession,
}

impl<B: CompletionBackend> Engine<B> {
    /// Constructs an engine over `backend` with default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, AppConfig::default())
    }

    pub fn with_config(backend: B, cfg: AppConfig) -> Self {
        Self {
            backend,
            llm: cfg.llm,
            max_retries: cfg.retry.max_retries,
            session: PreviewSession::new(cfg.preview),
        }
    }

    /// Runs the full pipeline for `theme` and returns the document now bound
    /// to the live preview.
    ///
    /// An empty (after trimming) theme fails with [`GenerationError::EmptyTheme`]
    /// before any network activity.
    pub async fn generate(&mut self, theme: &str) -> Result<&GameDocument, GenerationError> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(GenerationError::EmptyTheme);
        }

        let request = PromptBuilder::build(theme, &self.llm);
        let raw = complete_with_retry(&self.backend, &request, self.max_retries).await?;
        let doc = extract(&raw)?;
        self.session.show(doc)?;
        self.session
            .document()
            .ok_or(GenerationError::Preview(PreviewError::NoActiveDocument))
    }

    /// The currently live preview handle, if any.
    pub fn active_preview(&self) -> Option<&PreviewHandle> {
        self.session.active()
    }

    /// Re-materializes the preview from the currently bound document without
    /// re-running generation or extraction.
    pub fn reset_preview(&mut self) -> Result<&PreviewHandle, GenerationError> {
        Ok(self.session.reset()?)
    }

    /// Raw HTML of the bound document, for the collaborator's copy/download
    /// affordance.
    pub fn export_document(&self) -> Option<&str> {
        self.session.document().map(|doc| doc.html())
    }

    /// Releases the live preview resource. Idempotent.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}

impl Engine<OpenAiClient> {
    /// Engine wired to the real provider endpoint from `cfg`.
    pub fn from_config(cfg: AppConfig) -> Self {
        let backend = OpenAiClient::new(cfg.llm.endpoint.clone(), cfg.llm.api_key_env_var.clone());
        Self::with_config(backend, cfg)
    }
}
