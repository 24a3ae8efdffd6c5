use super::{prompts, DialogueConfig, DialogueContext, DialogueError};
use async_trait::async_trait;
use claude::{Claude, Request, Turn};

/// Shown when the backend call fails or times out.
pub const CONNECTION_FALLBACK: &str =
    "[System]: Connection to AI Core unstable. (Error generating dialogue)";

/// Shown when the backend answers with nothing.
pub const EMPTY_REPLY: &str = "...";

/// Produces NPC replies. Never fails; implementations return fallback text.
#[async_trait]
pub trait DialogueGenerator: Send + Sync {
    async fn generate(&self, context: &DialogueContext) -> String;
}

/// Dialogue voiced by Claude.
pub struct ClaudeDialogue {
    client: Claude,
    config: DialogueConfig,
}

impl ClaudeDialogue {
    pub fn new(client: Claude, config: DialogueConfig) -> Self {
        Self { client, config }
    }

    /// Build from `ANTHROPIC_API_KEY`.
    pub fn from_env(config: DialogueConfig) -> Result<Self, DialogueError> {
        let client = Claude::from_env().map_err(|_| DialogueError::NoApiKey)?;
        Ok(Self::new(client, config))
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    fn request(&self, context: &DialogueContext) -> Request {
        let mut request = Request::new(vec![Turn::user(prompts::user_prompt(context))])
            .with_system(prompts::system_prompt(&context.npc_name))
            .with_max_tokens(self.config.max_tokens);
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }
        if let Some(temp) = self.config.temperature {
            request = request.with_temperature(temp);
        }
        request
    }

    /// One request with the configured timeout. Empty replies come back as
    /// [`EMPTY_REPLY`].
    pub async fn try_generate(&self, context: &DialogueContext) -> Result<String, DialogueError> {
        let response = tokio::time::timeout(
            self.config.timeout,
            self.client.complete(self.request(context)),
        )
        .await
        .map_err(|_| DialogueError::Timeout(self.config.timeout))??;

        let text = response.text.trim();
        if text.is_empty() {
            Ok(EMPTY_REPLY.to_string())
        } else {
            Ok(text.to_string())
        }
    }
}

#[async_trait]
impl DialogueGenerator for ClaudeDialogue {
    async fn generate(&self, context: &DialogueContext) -> String {
        match self.try_generate(context).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(npc = %context.npc_name, error = %e, "dialogue generation failed");
                CONNECTION_FALLBACK.to_string()
            }
        }
    }
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineDialogue;

#[async_trait]
impl DialogueGenerator for OfflineDialogue {
    async fn generate(&self, context: &DialogueContext) -> String {
        format!(
            "[System]: API Key missing. The {} stares at you silently (simulated mode).",
            context.npc_name
        )
    }
}

/// Claude when a key is configured, offline otherwise.
pub fn generator_from_env(config: DialogueConfig) -> Box<dyn DialogueGenerator> {
    match ClaudeDialogue::from_env(config) {
        Ok(claude) => Box::new(claude),
        Err(e) => {
            tracing::info!(error = %e, "using offline dialogue");
            Box::new(OfflineDialogue)
        }
    }
}
