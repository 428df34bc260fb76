use serde::{Deserialize, Serialize};

/// Generation parameters for one request to the chat model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    label: String,
    max_tokens: u32,
    temperature: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    n: u8,
}

impl GenerationConfig {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            max_tokens: 750,
            temperature: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            n: 1,
        }
    }

    /// The configuration every turn tries first.
    pub fn primary() -> Self {
        Self::new("primary")
            .with_max_tokens(750)
            .with_temperature(1.0)
            .with_frequency_penalty(0.5)
            .with_presence_penalty(0.75)
    }

    /// Cheaper, less constrained configuration used after a primary failure.
    pub fn fallback() -> Self {
        Self::new("fallback")
            .with_max_tokens(500)
            .with_temperature(1.0)
            .with_frequency_penalty(0.2)
            .with_presence_penalty(0.2)
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = penalty;
        self
    }

    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = penalty;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn frequency_penalty(&self) -> f32 {
        self.frequency_penalty
    }

    pub fn presence_penalty(&self) -> f32 {
        self.presence_penalty
    }

    /// Number of candidates requested. Only the first one is ever used.
    pub fn n(&self) -> u8 {
        self.n
    }
}

/// Ordered list of configurations a turn tries until one succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptPlan {
    configs: Vec<GenerationConfig>,
}

impl AttemptPlan {
    /// Falls back to [`AttemptPlan::default`] when `configs` is empty so a
    /// turn always makes at least one request.
    pub fn new(configs: Vec<GenerationConfig>) -> Self {
        if configs.is_empty() {
            return Self::default();
        }
        Self { configs }
    }

    pub fn configs(&self) -> &[GenerationConfig] {
        &self.configs
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl Default for AttemptPlan {
    fn default() -> Self {
        Self {
            configs: vec![GenerationConfig::primary(), GenerationConfig::fallback()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptRole {
    System,
    User,
    Assistant,
}

impl PromptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptRole::System => "system",
            PromptRole::User => "user",
            PromptRole::Assistant => "assistant",
        }
    }
}

/// One entry of the message list sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Provider-neutral chat request: prompt messages plus one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    messages: Vec<PromptMessage>,
    config: GenerationConfig,
}

impl ChatRequest {
    pub fn new(messages: Vec<PromptMessage>, config: GenerationConfig) -> Self {
        Self { messages, config }
    }

    pub fn messages(&self) -> &[PromptMessage] {
        &self.messages
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

/// A successful model response: the extracted reply and the raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    reply: String,
    raw: serde_json::Value,
}

impl ChatCompletion {
    pub fn new(reply: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            reply: reply.into(),
            raw,
        }
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn into_parts(self) -> (String, serde_json::Value) {
        (self.reply, self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_parameters() {
        let config = GenerationConfig::primary();

        assert_eq!(config.label(), "primary");
        assert_eq!(config.max_tokens(), 750);
        assert_eq!(config.temperature(), 1.0);
        assert_eq!(config.frequency_penalty(), 0.5);
        assert_eq!(config.presence_penalty(), 0.75);
        assert_eq!(config.n(), 1);
    }

    #[test]
    fn test_fallback_parameters() {
        let config = GenerationConfig::fallback();

        assert_eq!(config.label(), "fallback");
        assert_eq!(config.max_tokens(), 500);
        assert_eq!(config.temperature(), 1.0);
        assert_eq!(config.frequency_penalty(), 0.2);
        assert_eq!(config.presence_penalty(), 0.2);
        assert_eq!(config.n(), 1);
    }

    #[test]
    fn test_default_plan_is_primary_then_fallback() {
        let plan = AttemptPlan::default();
        let labels: Vec<_> = plan.configs().iter().map(|c| c.label()).collect();

        assert_eq!(labels, vec!["primary", "fallback"]);
    }

    #[test]
    fn test_empty_plan_uses_default() {
        assert_eq!(AttemptPlan::new(Vec::new()), AttemptPlan::default());
    }
}
