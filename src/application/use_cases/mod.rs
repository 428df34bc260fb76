mod build_prompt;
mod run_turn;

pub use build_prompt::*;
pub use run_turn::*;
