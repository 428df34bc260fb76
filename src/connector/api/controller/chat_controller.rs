use std::io::Write;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::application::TurnError;
use crate::domain::{Route, SessionState};

use super::super::Container;
use super::transcript::{format_message, thinking_spinner};

const HELP: &str = "Type a farming question and press Enter. \
Commands: /history, /raw, /quit";

/// Interactive chat loop: the terminal host for one session.
pub struct ChatController<'a> {
    container: &'a Container,
}

impl<'a> ChatController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Reads one submission per line until end of input or `/quit`.
    ///
    /// Every line that is not a command is submitted as a turn, blank lines
    /// included. A turn that fails on every attempt prints a "please try
    /// again" notice and the session carries on.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<SessionState>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let use_case = self.container.run_turn_use_case();
        let mut session = self.container.new_session();
        info!(
            "Session {} started ({})",
            session.id(),
            self.container.model_name()
        );

        match session.route() {
            Route::GeneralChat => writeln!(output, "Farmer Chat\n{HELP}\n")?,
        }

        use_case.start(&mut session);
        let mut shown = print_new(&mut session, &mut output, 0)?;

        let mut lines = input.lines();
        loop {
            write!(output, "> ")?;
            output.flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            match line.trim() {
                "/quit" | "/exit" => break,
                "/history" => {
                    let records = session.store().serialize().to_records();
                    writeln!(output, "{}", serde_json::to_string_pretty(&records)?)?;
                    continue;
                }
                "/raw" => {
                    match session.last_response() {
                        Some(raw) => writeln!(output, "{}", serde_json::to_string_pretty(raw)?)?,
                        None => writeln!(output, "(no response yet)")?,
                    }
                    continue;
                }
                _ => {}
            }

            let spinner = thinking_spinner();
            let result = use_case.execute(&mut session, &line).await;
            spinner.finish_and_clear();

            match result {
                Ok(_) => {
                    shown = print_new(&mut session, &mut output, shown)?;
                }
                Err(e @ TurnError::Exhausted { .. }) => {
                    warn!("Turn failed: {}", e);
                    // The user message stays in the history; skip re-printing it.
                    shown = session.store().len();
                    writeln!(output, "{}\n", e.user_message())?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            "Session {} ended with {} messages",
            session.id(),
            session.store().len()
        );
        Ok(session)
    }
}

/// Renders the conversation and prints the messages after the first `shown`.
fn print_new<W: Write>(session: &mut SessionState, output: &mut W, shown: usize) -> Result<usize> {
    let rendered = session.render();
    for message in rendered.iter().skip(shown) {
        writeln!(output, "{}\n", format_message(message))?;
    }
    Ok(rendered.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::TRY_AGAIN_MESSAGE;
    use crate::connector::{ContainerConfig, MockChatClient};
    use crate::domain::{DisplayIdPolicy, DomainError, Message};

    fn container(client: MockChatClient) -> Container {
        Container::with_client(Arc::new(client), ContainerConfig::default())
    }

    #[tokio::test]
    async fn test_session_runs_each_line_as_turn() {
        let container = container(MockChatClient::scripted(vec![
            Ok("Mulch them.".into()),
            Ok("Every two weeks.".into()),
        ]));
        let controller = ChatController::new(&container);
        let mut out = Vec::new();

        let session = controller
            .run(&b"How do I keep weeds down?\nHow often to water?\n"[..], &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Farmer: What questions can I answer for you today?"));
        assert!(printed.contains("You: How do I keep weeds down?"));
        assert!(printed.contains("Farmer: Every two weeks."));
        assert_eq!(printed.matches("Farmer: Mulch them.").count(), 1);
        assert_eq!(session.store().len(), 5);
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_session_alive() {
        let container = container(MockChatClient::scripted(vec![
            Err(DomainError::provider("a")),
            Err(DomainError::provider("b")),
            Ok("Back online.".into()),
        ]));
        let controller = ChatController::new(&container);
        let mut out = Vec::new();

        let session = controller
            .run(&b"first\nsecond\n"[..], &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains(TRY_AGAIN_MESSAGE));
        assert!(printed.contains("Farmer: Back online."));
        assert_eq!(session.store().len(), 4);
    }

    #[tokio::test]
    async fn test_blank_line_is_a_turn_and_quit_stops() {
        let container = container(MockChatClient::scripted(vec![Ok("Ask away!".into())]));
        let controller = ChatController::new(&container);
        let mut out = Vec::new();

        let session = controller
            .run(&b"\n/quit\nnever sent\n"[..], &mut out)
            .await
            .unwrap();

        let messages = session.store().conversation().unwrap().messages().to_vec();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], Message::user(""));
    }

    #[tokio::test]
    async fn test_raw_and_history_commands() {
        let container = container(MockChatClient::scripted(vec![Ok("Sure.".into())]));
        let controller = ChatController::new(&container);
        let mut out = Vec::new();

        controller
            .run(&b"/raw\nquestion\n/raw\n/history\n"[..], &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("(no response yet)"));
        assert!(printed.contains("\"chat.completion\""));
        assert!(printed.contains("\"role\": \"user\""));
    }

    #[tokio::test]
    async fn test_legacy_identities_after_first_turn() {
        let config = ContainerConfig {
            display_ids: DisplayIdPolicy::Legacy,
            ..ContainerConfig::default()
        };
        let client = MockChatClient::scripted(vec![Ok("Rotate them.".into())]);
        let container = Container::with_client(Arc::new(client), config);
        let mut out = Vec::new();

        let session = ChatController::new(&container)
            .run(&b"How do I rotate crops?\n"[..], &mut out)
            .await
            .unwrap();

        // opening page +1, turn page +1, then keys 2, 4, 5 and +2 after the reply
        assert_eq!(session.display_counter().peek(), 7);
    }
}
