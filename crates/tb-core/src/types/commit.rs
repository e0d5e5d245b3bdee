use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct CommitAuthor {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// One commit of a GitHub push delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitEvent {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub author: CommitAuthor,
    #[serde(default)]
    pub url: String,
}

impl CommitEvent {
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(10) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    /// Text attached to every ticket the commit touches, and the text the
    /// command parser scans.
    pub fn display_message(&self) -> String {
        format!("(In [{} {}]) {}", self.url, self.short_id(), self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct PushRepository {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PushPayload {
    #[serde(default)]
    pub repository: PushRepository,
    #[serde(default)]
    pub commits: Vec<CommitEvent>,
}
