use crate::types::{GenerationRequest, LlmConfig};

/// Fixed instruction contract sent as the system message on every request.
/// The model must honor the marker protocol exactly; everything outside the
/// markers is discarded by the extractor.
const SYSTEM_PROMPT: &str = r#"You are a game engine that outputs a single, self-contained HTML5 file implementing a playable game using Phaser 3.

CRITICAL RULES:
1) Output ONLY the full HTML document between the exact markers:
<!--BEGIN_GAME_HTML-->
... your full HTML here ...
<!--END_GAME_HTML-->
No commentary, no markdown, no explanations outside the markers.

2) The HTML must be fully self-contained:
   - Include <html>, <head>, <body>.
   - Include a <meta name="viewport"> for mobile.
   - Load Phaser 3 via a single <script> tag from a public CDN that doesn't need build steps.
   - No imports, no bundlers, no external CSS or assets. If assets are needed, generate with Canvas or simple shapes/text.

3) Create a small but complete, playable game that fits the user's theme (e.g., racing, puzzle, snake, collecting).
   - Provide keyboard/touch controls.
   - Show a score or win/lose condition.
   - Run at 800x600 (or responsive to window).
   - Include basic instructions on screen (small text).

4) Use only standard JS in a single <script> block. No TypeScript. No modules. No async imports.

5) Performance & Safety:
   - No network requests.
   - No eval or new Function.
   - Handle game restart (e.g., press R to restart)."#;

/// Builds immutable [`GenerationRequest`] values from a theme and the
/// configured sampling parameters.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Composes the request for one generation.
    ///
    /// The caller is expected to pass a trimmed, non-empty theme; the
    /// pipeline rejects empty themes before reaching this point. Sampling
    /// parameters are coerced into their valid ranges here so a bad config
    /// file cannot produce an invalid request.
    pub fn build(theme: &str, llm: &LlmConfig) -> GenerationRequest {
        GenerationRequest {
            theme: theme.to_string(),
            model: llm.model.clone(),
            temperature: llm.temperature.clamp(0.0, 2.0),
            max_tokens: llm.max_tokens.max(1),
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: format!(
                "Create a Phaser 3 HTML5 game for the theme: \"{theme}\".\nKeep it simple, fun, and immediately playable."
            ),
        }
    }
}
