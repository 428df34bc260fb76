use async_trait::async_trait;

use crate::domain::{ChatCompletion, ChatRequest, DomainError};

/// An interface for sending a chat request to a hosted language model.
///
/// Implementors encapsulate transport, serialization, and vendor-specific API
/// details. The turn workflow only sees provider-neutral requests and
/// completions.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send the request and return the first candidate's reply together with
    /// the raw response payload.
    ///
    /// Any failure (transport, non-success status, unparseable or empty
    /// body) is reported as an error; callers decide whether to retry.
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, DomainError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
