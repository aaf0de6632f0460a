use serde::{Deserialize, Serialize};

/// What the caller wants done with the prompt. Without one, the model is
/// asked to classify the prompt itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Return the retrieved example verbatim.
    Build,
    /// Change the website returned earlier in the conversation.
    Modify,
    /// Reply in prose, no code.
    Converse,
}

const CODE_ONLY_NOTE: &str = "Note***\nDon't give any explanation of the code. Return code as the response for the user to copy easily.***";

const ROLE_REMINDER: &str =
    "tell them that you are a website builder and you return html, css and js code for a website prompt";

/// Builds the single instruction sent as the new user turn.
pub fn compose_instruction(prompt: &str, retrieved_example: &str, intent: Option<Intent>) -> String {
    match intent {
        None => format!(
            "If this prompt #{prompt}# by the user is requesting a website, return this *exact* code #{retrieved_example}# as your response. \
Else if the prompt is requesting a change to a component of the website you already built (the one you provided in a previous response), modify only that code and return the modified code. \
Else converse with the user and {ROLE_REMINDER}.\n{CODE_ONLY_NOTE}"
        ),
        Some(Intent::Build) => format!(
            "The user requested this website: #{prompt}#. Return this *exact* code #{retrieved_example}# as your response.\n{CODE_ONLY_NOTE}"
        ),
        Some(Intent::Modify) => format!(
            "The user wants this change to the website you already built (the one you provided in a previous response): #{prompt}#. \
Modify only that code and return the complete modified code.\n{CODE_ONLY_NOTE}"
        ),
        Some(Intent::Converse) => format!(
            "The user said: #{prompt}#. Do not return any code. Converse with the user and {ROLE_REMINDER}."
        ),
    }
}
