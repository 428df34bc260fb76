use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::ChatClient;
use crate::domain::{ChatCompletion, ChatRequest, DomainError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const COMPLETIONS_PATH: &str = "/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ORG_VAR: &str = "OPENAI_ORG";
pub const BASE_URL_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL";

/// Credentials and endpoint for the chat-completions API.
///
/// | Variable          | Default                  | Purpose                 |
/// |-------------------|--------------------------|-------------------------|
/// | `OPENAI_API_KEY`  | required                 | Bearer token            |
/// | `OPENAI_ORG`      | required                 | Organization header     |
/// | `OPENAI_BASE_URL` | `https://api.openai.com` | Any compatible server   |
/// | `OPENAI_MODEL`    | `gpt-3.5-turbo`          | Model identifier        |
///
/// Variables may also come from a `.env` file; values already set in the
/// process environment take precedence.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub organization: String,
    pub base_url: String,
    pub model: String,
}

impl OpenAiConfig {
    /// Read the configuration once from the process environment, after
    /// loading `.env` from the working directory (or a parent) if present.
    pub fn from_env() -> Result<Self, DomainError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("Ignoring unreadable .env file: {e}"),
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration from an explicit env file, with the process
    /// environment taking precedence over the file.
    pub fn from_env_file(path: &Path) -> Result<Self, DomainError> {
        let file = read_env_file(path)?;
        Self::from_lookup(|name| std::env::var(name).ok().or_else(|| file.get(name).cloned()))
    }

    /// Build the configuration from any variable source. Missing or blank
    /// credentials are a configuration error naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            get(name).ok_or_else(|| {
                DomainError::configuration(format!("environment variable {name} is not set"))
            })
        };

        Ok(Self {
            api_key: required(API_KEY_VAR)?,
            organization: required(ORG_VAR)?,
            base_url: get(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn read_env_file(path: &Path) -> Result<HashMap<String, String>, DomainError> {
    let entries = dotenvy::from_path_iter(path).map_err(|e| {
        DomainError::configuration(format!("cannot read {}: {e}", path.display()))
    })?;

    entries
        .map(|entry| {
            entry.map_err(|e| {
                DomainError::configuration(format!("invalid line in {}: {e}", path.display()))
            })
        })
        .collect()
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    n: u8,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Minimal subset of the chat-completions response we care about.
#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// HTTP client for the OpenAI chat-completions API (and compatible servers).
///
/// Every request is a single call: status errors, transport errors and
/// bodies without a first choice all come back as [`DomainError`] so the
/// turn workflow can move on to its next configuration.
pub struct OpenAiChatClient {
    client: reqwest::Client,
    config: OpenAiConfig,
    /// Full endpoint URL (base + COMPLETIONS_PATH).
    url: String,
}

impl OpenAiChatClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, DomainError> {
        let url = format!("{}{}", config.base_url.trim_end_matches('/'), COMPLETIONS_PATH);
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DomainError::internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            url,
        })
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn build_body<'a>(&'a self, request: &'a ChatRequest) -> ApiRequest<'a> {
        let config = request.config();
        ApiRequest {
            model: &self.config.model,
            messages: request
                .messages()
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: config.max_tokens(),
            temperature: config.temperature(),
            frequency_penalty: config.frequency_penalty(),
            presence_penalty: config.presence_penalty(),
            n: config.n(),
        }
    }

    /// Pull the first candidate's text out of a raw response body.
    fn extract_reply(raw: &serde_json::Value) -> Result<String, DomainError> {
        let response: ApiResponse = serde_json::from_value(raw.clone())
            .map_err(|e| DomainError::malformed(format!("unexpected response shape: {e}")))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::malformed("response contained no reply"))
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, DomainError> {
        let body = self.build_body(request);
        debug!(
            "OpenAiChatClient: POST {} ({} messages, {} config)",
            self.url,
            body.messages.len(),
            request.config().label()
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.config.api_key)
            .header("OpenAI-Organization", &self.config.organization)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::provider(format!("OpenAiChatClient: request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("OpenAiChatClient: API returned {status}: {text}");
            return Err(DomainError::provider(format!(
                "OpenAiChatClient: API returned {status}"
            )));
        }

        let raw: serde_json::Value = response.json().await.map_err(|e| {
            DomainError::malformed(format!("OpenAiChatClient: failed to parse response: {e}"))
        })?;

        let reply = Self::extract_reply(&raw)?;
        Ok(ChatCompletion::new(reply, raw))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;
    use crate::domain::{GenerationConfig, PromptMessage};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    fn test_config() -> OpenAiConfig {
        OpenAiConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk-test"), (ORG_VAR, "org-test")]))
            .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = test_config();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.organization, "org-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_config_missing_key_fails_fast() {
        let err = OpenAiConfig::from_lookup(lookup(&[(ORG_VAR, "org-test")])).unwrap_err();

        assert!(err.is_configuration());
        assert!(err.to_string().contains(API_KEY_VAR));
    }

    #[test]
    fn test_config_blank_org_counts_as_missing() {
        let err = OpenAiConfig::from_lookup(lookup(&[(API_KEY_VAR, "sk"), (ORG_VAR, "  ")]))
            .unwrap_err();

        assert!(err.to_string().contains(ORG_VAR));
    }

    #[test]
    fn test_config_overrides() {
        let config = OpenAiConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "sk"),
            (ORG_VAR, "org"),
            (BASE_URL_VAR, "http://localhost:8080/"),
            (MODEL_VAR, "gpt-4o-mini"),
        ]))
        .unwrap();
        let client = OpenAiChatClient::new(config).unwrap();

        assert_eq!(client.url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(client.model_name(), "gpt-4o-mini");
    }

    #[test]
    fn test_env_file_supplies_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{API_KEY_VAR}=sk-from-file").unwrap();
        writeln!(file, "{ORG_VAR}=\"org-from-file\"").unwrap();
        writeln!(file, "# comment").unwrap();

        let vars = read_env_file(file.path()).unwrap();
        let config = OpenAiConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.api_key, "sk-from-file");
        assert_eq!(config.organization, "org-from-file");
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_env_file_without_credentials_still_fails_fast() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{MODEL_VAR}=gpt-4o-mini").unwrap();

        let vars = read_env_file(file.path()).unwrap();
        let err = OpenAiConfig::from_lookup(|name| vars.get(name).cloned()).unwrap_err();

        assert!(err.is_configuration());
    }

    #[test]
    fn test_missing_env_file_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = OpenAiConfig::from_env_file(&dir.path().join("absent.env")).unwrap_err();

        assert!(err.is_configuration());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("sk-test"));
    }

    #[test]
    fn test_body_carries_generation_parameters() {
        let client = OpenAiChatClient::new(test_config()).unwrap();
        let request = ChatRequest::new(
            vec![PromptMessage::system("sys"), PromptMessage::user("hi")],
            GenerationConfig::fallback(),
        );

        let body = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["n"], 1);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert!((body["presence_penalty"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!((body["frequency_penalty"].as_f64().unwrap() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_extract_reply_takes_first_choice() {
        let raw = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "first" } },
                { "message": { "role": "assistant", "content": "second" } }
            ]
        });

        assert_eq!(OpenAiChatClient::extract_reply(&raw).unwrap(), "first");
    }

    #[test]
    fn test_extract_reply_rejects_empty_choices() {
        let err = OpenAiChatClient::extract_reply(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, DomainError::MalformedResponse(_)));
    }

    #[test]
    fn test_extract_reply_rejects_error_body() {
        let raw = json!({ "error": { "message": "quota exceeded" } });
        assert!(OpenAiChatClient::extract_reply(&raw).is_err());
    }
}
