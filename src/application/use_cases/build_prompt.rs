use crate::domain::{PromptMessage, Snapshot};

/// Builds the message list for one farming question.
///
/// The system message carries the question and a plain `Speaker: content`
/// transcript of the conversation so far; the user message restates the
/// question.
pub fn build_prompt(snapshot: Snapshot<'_>, question: &str) -> Vec<PromptMessage> {
    let system = format!(
        "You are a knowledgeable and helpful farming assistant who can answer the user's \
         various question {question} about farming.\n\
         The conversation you have had so far is:\n\
         {transcript}\n\
         Please respond as a friendly farmer to help them with their questions.",
        transcript = snapshot.transcript(),
    );

    vec![
        PromptMessage::system(system),
        PromptMessage::user(format!("I have a question about farming.  {question}")),
    ]
}
