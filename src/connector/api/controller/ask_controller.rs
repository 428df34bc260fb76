use anyhow::{Context, Result};

use crate::application::TRY_AGAIN_MESSAGE;

use super::super::Container;
use super::transcript::{format_transcript, thinking_spinner};

/// Answers one question in a fresh session.
pub struct AskController<'a> {
    container: &'a Container,
}

impl<'a> AskController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Runs a single turn and returns the rendered conversation, or the
    /// serialized `{role, content}` records when `json` is set. A turn whose
    /// attempts all fail is returned as an error headed by the try-again
    /// notice.
    pub async fn ask(&self, question: String, json: bool) -> Result<String> {
        let use_case = self.container.run_turn_use_case();
        let mut session = self.container.new_session();
        use_case.start(&mut session);

        let spinner = thinking_spinner();
        let result = use_case.execute(&mut session, &question).await;
        spinner.finish_and_clear();
        result.with_context(|| TRY_AGAIN_MESSAGE)?;

        if json {
            let records = session.store().serialize().to_records();
            return Ok(serde_json::to_string_pretty(&records)?);
        }

        Ok(format_transcript(&session.render()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::connector::{ContainerConfig, MockChatClient};
    use crate::domain::{DomainError, MessageRecord, Role};

    fn container(client: MockChatClient) -> Container {
        Container::with_client(Arc::new(client), ContainerConfig::default())
    }

    #[tokio::test]
    async fn test_ask_renders_whole_conversation() {
        let container = container(MockChatClient::scripted(vec![Ok("Plant in spring.".into())]));
        let controller = AskController::new(&container);

        let output = controller.ask("When do I plant onions?".into(), false).await.unwrap();

        assert_eq!(
            output,
            "Farmer: What questions can I answer for you today?\n\n\
             You: When do I plant onions?\n\n\
             Farmer: Plant in spring."
        );
    }

    #[tokio::test]
    async fn test_ask_json_outputs_records() {
        let container = container(MockChatClient::scripted(vec![Ok("Yes.".into())]));
        let controller = AskController::new(&container);

        let output = controller.ask("Can hens eat rice?".into(), true).await.unwrap();
        let records: Vec<MessageRecord> = serde_json::from_str(&output).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].role, Role::User);
        assert_eq!(records[2].content, "Yes.");
    }

    #[tokio::test]
    async fn test_ask_surfaces_exhausted_turn() {
        let container = container(MockChatClient::scripted(vec![
            Err(DomainError::provider("down")),
            Err(DomainError::provider("still down")),
        ]));
        let controller = AskController::new(&container);

        let err = controller.ask("Anyone there?".into(), false).await.unwrap_err();

        assert_eq!(err.to_string(), TRY_AGAIN_MESSAGE);
        assert!(format!("{err:#}").contains("all 2 attempts failed"));
    }
}
