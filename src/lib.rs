pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    build_prompt, AttemptFailure, ChatClient, RunTurnUseCase, TurnError, TurnOutcome,
    DEFAULT_GREETING, TRY_AGAIN_MESSAGE,
};

pub use connector::{
    AskController, ChatController, Container, ContainerConfig, MockChatClient, OpenAiChatClient,
    OpenAiConfig, Router,
};

pub use domain::{
    AttemptPlan, ChatCompletion, ChatRequest, Conversation, ConversationStore, DisplayIdPolicy,
    DomainError, GenerationConfig, Message, MessageRecord, PromptMessage, PromptRole,
    RenderedMessage, Role, Route, SessionState, Snapshot, TurnPhase,
};
