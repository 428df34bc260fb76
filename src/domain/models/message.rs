use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a conversational turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when the role is shown to a person or the model.
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Farmer",
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversational turn. Fields are private so a message cannot be
/// edited after it has been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.role.speaker(), self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn test_transcript_line_uses_speaker_label() {
        assert_eq!(Message::user("Hello").transcript_line(), "User: Hello");
        assert_eq!(
            Message::assistant("Howdy").transcript_line(),
            "Farmer: Howdy"
        );
    }
}
