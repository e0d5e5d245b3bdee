use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a commit message asks to be done to a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    Close,
    Reference,
    ReturnToReporter,
}

impl Action {
    /// Resolves an action word, case-insensitively. Unknown words yield `None`.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "close" | "closed" | "closes" | "fix" | "fixed" | "fixes" => Some(Self::Close),
            "addresses" | "re" | "references" | "refs" | "ref" | "see" => Some(Self::Reference),
            "return" | "returns" => Some(Self::ReturnToReporter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Command {
    pub action: Action,
    /// Raw digits from the message; zero is syntactically valid here.
    pub ticket_id: u64,
}

impl Command {
    pub fn new(action: Action, ticket_id: u64) -> Self {
        Self { action, ticket_id }
    }
}
