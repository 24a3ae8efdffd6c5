//! NPC dialogue generation.
//!
//! The engine only sees [`DialogueGenerator`]: an async call that always
//! produces a line of text. Backend failures turn into in-world fallback
//! lines instead of errors.

mod generator;
pub mod prompts;

pub use generator::{
    generator_from_env, ClaudeDialogue, DialogueGenerator, OfflineDialogue, CONNECTION_FALLBACK,
    EMPTY_REPLY,
};

use std::time::Duration;
use thiserror::Error;

/// Errors from the dialogue backend. Only surfaced by
/// [`ClaudeDialogue::try_generate`]; the trait maps them to fallback text.
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("Claude API error: {0}")]
    Claude(#[from] claude::Error),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Dialogue request timed out after {0:?}")]
    Timeout(Duration),
}

/// What the generator needs to voice one NPC reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogueContext {
    pub npc_name: String,
    pub player_input: String,
    /// Earlier lines of this conversation, oldest first.
    pub history: Vec<String>,
}

impl DialogueContext {
    pub fn new(npc_name: impl Into<String>, player_input: impl Into<String>) -> Self {
        Self {
            npc_name: npc_name.into(),
            player_input: player_input.into(),
            history: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }
}

/// Configuration for the Claude dialogue backend.
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    /// The model to use (client default when unset).
    pub model: Option<String>,

    /// Maximum tokens for a reply. Replies are meant to be short.
    pub max_tokens: usize,

    pub temperature: Option<f32>,

    /// Upper bound on one request, including connection time.
    pub timeout: Duration,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 150,
            temperature: Some(0.9),
            timeout: Duration::from_secs(20),
        }
    }
}

impl DialogueConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = DialogueConfig::new()
            .with_model("claude-3-5-haiku-latest")
            .with_max_tokens(64)
            .with_temperature(0.2)
            .with_timeout(Duration::from_secs(3));

        assert_eq!(config.model.as_deref(), Some("claude-3-5-haiku-latest"));
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.temperature, Some(0.2));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_error_wraps_client_error() {
        let err: DialogueError = claude::Error::NoApiKey.into();
        assert!(matches!(err, DialogueError::Claude(claude::Error::NoApiKey)));
        assert!(err.to_string().starts_with("Claude API error"));
    }
}
