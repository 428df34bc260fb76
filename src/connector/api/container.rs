use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::application::{ChatClient, RunTurnUseCase};
use crate::connector::{MockChatClient, OpenAiChatClient, OpenAiConfig};
use crate::domain::{DisplayIdPolicy, SessionState};

pub struct ContainerConfig {
    /// Answer from the offline scripted client instead of the hosted model.
    /// No credentials are read in this mode.
    pub mock: bool,
    pub display_ids: DisplayIdPolicy,
    /// Overrides `OPENAI_MODEL`.
    pub model: Option<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            mock: false,
            display_ids: DisplayIdPolicy::default(),
            model: None,
        }
    }
}

pub struct Container {
    chat_client: Arc<dyn ChatClient>,
    config: ContainerConfig,
}

impl Container {
    /// Wires the chat client. Outside mock mode the credentials are read here,
    /// once, and a missing one fails start-up.
    pub fn new(config: ContainerConfig) -> Result<Self> {
        let chat_client: Arc<dyn ChatClient> = if config.mock {
            debug!("Using mock chat client");
            Arc::new(MockChatClient::new())
        } else {
            let mut openai = OpenAiConfig::from_env()?;
            if let Some(model) = config.model.as_deref() {
                openai = openai.with_model(model);
            }
            debug!("Using OpenAI chat client: {:?}", openai);
            Arc::new(OpenAiChatClient::new(openai)?)
        };

        Ok(Self::with_client(chat_client, config))
    }

    /// Wire an explicit client, bypassing environment configuration.
    pub fn with_client(chat_client: Arc<dyn ChatClient>, config: ContainerConfig) -> Self {
        Self {
            chat_client,
            config,
        }
    }

    pub fn run_turn_use_case(&self) -> RunTurnUseCase {
        RunTurnUseCase::new(self.chat_client.clone())
    }

    pub fn new_session(&self) -> SessionState {
        SessionState::with_display_policy(self.config.display_ids)
    }

    pub fn model_name(&self) -> &str {
        self.chat_client.model_name()
    }

    pub fn is_mock(&self) -> bool {
        self.config.mock
    }
}
