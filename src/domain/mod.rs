//! # Domain Layer
//!
//! Conversation model, session state and generation settings.
//! This layer is independent of external frameworks and infrastructure.

pub mod error;
pub mod models;

pub use error::*;
pub use models::*;
