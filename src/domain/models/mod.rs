mod conversation;
mod generation;
mod message;
mod session;

pub use conversation::*;
pub use generation::*;
pub use message::*;
pub use session::*;
