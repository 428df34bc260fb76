use serde::{Deserialize, Serialize};

use super::{Message, Role};
use crate::domain::DomainError;

/// Ordered, append-only message history for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// A conversation always opens with a synthetic assistant greeting.
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(greeting)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

/// Owned `{role, content}` record, the serialized form of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role(),
            content: message.content().to_string(),
        }
    }
}

/// Borrowed view over a conversation in append order.
///
/// Iterating does not copy the messages, and the snapshot is `Copy` so it can
/// be walked any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    messages: &'a [Message],
}

impl<'a> Snapshot<'a> {
    pub fn iter(&self) -> std::slice::Iter<'a, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn to_records(&self) -> Vec<MessageRecord> {
        self.iter().map(MessageRecord::from).collect()
    }

    /// One `Speaker: content` line per message.
    pub fn transcript(&self) -> String {
        self.iter()
            .map(Message::transcript_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for Snapshot<'a> {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Holds the session's conversation, if one has been started.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    conversation: Option<Conversation>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any existing conversation with a fresh one holding only the
    /// greeting.
    pub fn initialize(&mut self, greeting: impl Into<String>) -> &Conversation {
        self.conversation.insert(Conversation::with_greeting(greeting))
    }

    pub fn append(
        &mut self,
        content: impl Into<String>,
        role: Role,
    ) -> Result<&Conversation, DomainError> {
        let conversation = self
            .conversation
            .as_mut()
            .ok_or(DomainError::NotInitialized)?;
        conversation.push(Message::new(role, content));
        Ok(conversation)
    }

    pub fn serialize(&self) -> Snapshot<'_> {
        let messages = self
            .conversation
            .as_ref()
            .map(Conversation::messages)
            .unwrap_or(&[]);
        Snapshot { messages }
    }

    pub fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.conversation.is_some()
    }

    pub fn len(&self) -> usize {
        self.conversation.as_ref().map_or(0, Conversation::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
