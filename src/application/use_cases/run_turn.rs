use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::use_cases::build_prompt::build_prompt;
use crate::application::ChatClient;
use crate::domain::{AttemptPlan, ChatRequest, DomainError, Role, SessionState, TurnPhase};

pub const DEFAULT_GREETING: &str = "What questions can I answer for you today?";

/// Shown to the user when every attempt of a turn failed.
pub const TRY_AGAIN_MESSAGE: &str =
    "The farmer couldn't come up with an answer right now. Please try again.";

/// Why one configuration of the attempt plan did not produce a reply.
#[derive(Debug)]
pub struct AttemptFailure {
    pub config: String,
    pub error: DomainError,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("all {} attempts failed; last error: {}", .failures.len(), last_error(.failures))]
    Exhausted { failures: Vec<AttemptFailure> },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn last_error(failures: &[AttemptFailure]) -> String {
    failures
        .last()
        .map(|f| format!("[{}] {}", f.config, f.error))
        .unwrap_or_else(|| "none".to_string())
}

impl TurnError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn user_message(&self) -> &'static str {
        TRY_AGAIN_MESSAGE
    }
}

/// Result of a completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    /// Label of the configuration that produced the reply.
    pub config: String,
    /// Zero-based position of that configuration in the attempt plan.
    pub attempt: usize,
}

impl TurnOutcome {
    pub fn used_fallback(&self) -> bool {
        self.attempt > 0
    }
}

/// Drives exactly one request/response cycle per user submission.
pub struct RunTurnUseCase {
    chat_client: Arc<dyn ChatClient>,
    plan: AttemptPlan,
    greeting: String,
}

impl RunTurnUseCase {
    pub fn new(chat_client: Arc<dyn ChatClient>) -> Self {
        Self {
            chat_client,
            plan: AttemptPlan::default(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    pub fn with_plan(mut self, plan: AttemptPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// First render of a session: seeds the conversation with the greeting
    /// if nothing has been said yet. Calling it again is a no-op.
    pub fn start(&self, session: &mut SessionState) {
        if session.store().is_empty() {
            debug!("Session {}: initializing conversation", session.id());
            session.store_mut().initialize(self.greeting.as_str());
        }
    }

    /// Submits `user_input` as a turn. Blank input is accepted as-is.
    ///
    /// On success the conversation has grown by the user message and the
    /// reply. When every configuration fails, only the user message remains
    /// and [`TurnError::Exhausted`] is returned.
    pub async fn execute(
        &self,
        session: &mut SessionState,
        user_input: &str,
    ) -> Result<TurnOutcome, TurnError> {
        self.start(session);

        info!(
            "Session {}: new turn ({} chars, model {})",
            session.id(),
            user_input.len(),
            self.chat_client.model_name()
        );
        let start_time = Instant::now();

        session.set_phase(TurnPhase::Pending);
        session.store_mut().append(user_input, Role::User)?;
        let messages = build_prompt(session.store().serialize(), user_input);

        let mut failures = Vec::new();
        for (attempt, config) in self.plan.configs().iter().enumerate() {
            let request = ChatRequest::new(messages.clone(), config.clone());
            debug!(
                "Attempt {} with {} config (max_tokens={})",
                attempt + 1,
                config.label(),
                config.max_tokens()
            );

            match self.chat_client.complete(&request).await {
                Ok(completion) => {
                    session.set_phase(TurnPhase::Replying);
                    let (reply, raw) = completion.into_parts();
                    session.record_response(raw);
                    session.store_mut().append(reply.as_str(), Role::Assistant)?;
                    session.set_phase(TurnPhase::Idle);

                    info!(
                        "Session {}: reply from {} config in {:.2}s",
                        session.id(),
                        config.label(),
                        start_time.elapsed().as_secs_f64()
                    );

                    return Ok(TurnOutcome {
                        reply,
                        config: config.label().to_string(),
                        attempt,
                    });
                }
                Err(e) => {
                    warn!("{} request failed: {}", config.label(), e);
                    failures.push(AttemptFailure {
                        config: config.label().to_string(),
                        error: e,
                    });
                }
            }
        }

        session.set_phase(TurnPhase::Idle);
        warn!(
            "Session {}: turn abandoned after {} failed attempts",
            session.id(),
            failures.len()
        );
        Err(TurnError::Exhausted { failures })
    }
}
