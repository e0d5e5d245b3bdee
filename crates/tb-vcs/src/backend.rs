use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("repo not found")]
    RepoNotFound,
    #[error("invalid fetch command: {reason}")]
    InvalidCommand { reason: String },
    #[error("fetch failed: {reason}")]
    CommandFailed { reason: String },
    #[error("fetch timed out after {secs}s")]
    Timeout { secs: u64 },
    #[error("backend error: {reason}")]
    BackendError { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// `HEAD` after the fetch, `None` for an unborn branch.
    pub head: Option<String>,
    pub stderr: String,
}

/// Brings the local clone up to date with the remote that sent the webhook.
pub trait Fetcher {
    fn fetch(&self) -> Result<FetchOutcome, VcsError>;
}
