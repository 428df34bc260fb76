//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Chat completion (OpenAI-compatible HTTP, scripted mock)
//! - Host wiring (container, router, controllers)

pub mod adapter;
pub mod api;

pub use adapter::*;
pub use api::controller::{AskController, ChatController};
pub use api::{Container, ContainerConfig, Router};
