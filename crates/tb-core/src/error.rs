use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum RevmapError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

/// Malformed bulk-load input. Fatal to the whole import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("line {line}: expecting hash, found '{found}'")]
    ExpectedHash { line: usize, found: String },
    #[error("line {line}: expected git-svn-id, got '{found}'")]
    ExpectedMarker { line: usize, found: String },
    #[error("line {line}: malformed git-svn-id line '{found}'")]
    BadMarker { line: usize, found: String },
    #[error("unexpected end of input after r{last}, expected a hash")]
    UnexpectedEof { last: u32 },
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Read { path: String, message: String },
    #[error("cannot parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("revision map '{path}' not found")]
    MissingRevmapFile { path: String },
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {message}")]
    Failed { message: String },
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Ticket(#[from] TicketError),
    #[error(transparent)]
    Revmap(#[from] RevmapError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error(transparent)]
    Vcs(#[from] tb_vcs::backend::VcsError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
