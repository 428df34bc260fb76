use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::AskController;

pub struct Router<'a> {
    ask_controller: AskController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            ask_controller: AskController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Ask { question, json } => self.ask_controller.ask(question, json).await,
            Commands::Chat => unreachable!("Chat command is handled separately in main"),
        }
    }
}
