use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Legacy revision recorded for commits that only exist in git.
pub const NO_LEGACY_REVISION: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevisionEntry {
    pub legacy_revision: u32,
    pub content_hash: String,
    pub message: Option<String>,
}

impl RevisionEntry {
    pub fn new(legacy_revision: u32, content_hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            legacy_revision,
            content_hash: content_hash.into(),
            message: Some(message.into()),
        }
    }
}

/// A revmap hit for a reference typed by a user (`r1432`, `eb390eca04`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CommitLookup {
    pub hash: String,
    pub message: String,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RevisionGap {
    pub newer: u32,
    pub older: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub inserted: usize,
    pub gaps: Vec<RevisionGap>,
}
