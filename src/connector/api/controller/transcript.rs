use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::{RenderedMessage, Role};

pub const THINKING_MESSAGE: &str = "The farmer is thinking about your question...";

pub fn format_message(message: &RenderedMessage) -> String {
    let speaker = match message.role {
        Role::User => "You",
        Role::Assistant => "Farmer",
    };
    format!("{}: {}", speaker, message.content)
}

pub fn format_transcript(messages: &[RenderedMessage]) -> String {
    messages
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Busy indicator shown while a turn is in flight. Draws to stderr and stays
/// hidden when stderr is not a terminal.
pub fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(THINKING_MESSAGE);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
