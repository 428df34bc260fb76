use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start an interactive chat session (the default)
    Chat,

    /// Ask a single question in a fresh session and print the conversation
    Ask {
        question: String,

        /// Print the conversation as JSON `{role, content}` records
        #[arg(long)]
        json: bool,
    },
}
