use crate::error::RevmapError;
use crate::types::{CommitLookup, RevisionEntry};

/// Upper bound on rows returned by a single revmap query.
pub const HASH_LOOKUP_LIMIT: usize = 5;
pub const MIN_PREFIX_LEN: usize = 5;
pub const FULL_HASH_LEN: usize = 40;

pub trait RevisionMapRepository {
    /// Insert-only; duplicates are accepted.
    fn append(&self, legacy_revision: u32, hash: &str, message: &str) -> Result<(), RevmapError>;
    /// Rows for one legacy revision in insertion order, at most `limit`.
    fn list_by_revision(
        &self,
        legacy_revision: u32,
        limit: usize,
    ) -> Result<Vec<RevisionEntry>, RevmapError>;
    /// Rows whose hash starts with `prefix`, at most [`HASH_LOOKUP_LIMIT`].
    /// The prefix has already been validated by the caller.
    fn find_by_hash_prefix(&self, prefix: &str) -> Result<Vec<RevisionEntry>, RevmapError>;
    fn count(&self) -> Result<u64, RevmapError>;
    fn clear(&self) -> Result<(), RevmapError>;

    fn lookup_by_revision(&self, legacy_revision: u32) -> Result<Option<RevisionEntry>, RevmapError> {
        Ok(self.list_by_revision(legacy_revision, 1)?.into_iter().next())
    }

    fn lookup_by_hash_prefix(&self, prefix: &str) -> Result<Vec<RevisionEntry>, RevmapError> {
        match normalize_prefix(prefix) {
            Some(prefix) => self.find_by_hash_prefix(&prefix),
            None => Ok(Vec::new()),
        }
    }

    fn resolve(&self, reference: &str) -> Result<Vec<CommitLookup>, RevmapError> {
        let (query, rows) = match RevisionQuery::parse(reference) {
            RevisionQuery::Revision(rev) => (rev.to_string(), self.list_by_revision(rev, HASH_LOOKUP_LIMIT)?),
            RevisionQuery::HashPrefix(prefix) => {
                let rows = self.find_by_hash_prefix(&prefix)?;
                (reference.trim().to_string(), rows)
            }
            RevisionQuery::Invalid => return Ok(Vec::new()),
        };
        Ok(rows
            .into_iter()
            .map(|row| CommitLookup {
                hash: row.content_hash,
                message: row.message.unwrap_or_default(),
                query: query.clone(),
            })
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevisionQuery {
    Revision(u32),
    HashPrefix(String),
    Invalid,
}

impl RevisionQuery {
    /// `r<N>` selects a legacy revision, anything hex-shaped a hash prefix.
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        if let Some(digits) = reference.strip_prefix('r') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits
                    .parse::<u32>()
                    .map_or(Self::Invalid, Self::Revision);
            }
        }
        normalize_prefix(reference).map_or(Self::Invalid, Self::HashPrefix)
    }
}

pub fn normalize_prefix(prefix: &str) -> Option<String> {
    let prefix = prefix.trim();
    if !(MIN_PREFIX_LEN..=FULL_HASH_LEN).contains(&prefix.len()) {
        return None;
    }
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(prefix.to_ascii_lowercase())
}

pub fn is_full_hash(value: &str) -> bool {
    value.len() == FULL_HASH_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
