use crate::backend::{FetchOutcome, Fetcher, VcsError};
use crate::detection::detect_repo;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

const OUTPUT_LIMIT: usize = 16 * 1024;
pub const DEFAULT_FETCH_COMMAND: &str = "git fetch";

pub struct GitFetcher {
    repo_dir: PathBuf,
    command: String,
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(repo_dir: impl Into<PathBuf>, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            command: command.into(),
            timeout,
        }
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }
}

impl Fetcher for GitFetcher {
    fn fetch(&self) -> Result<FetchOutcome, VcsError> {
        detect_repo(&self.repo_dir)?;
        let stderr = run_fetch(&self.repo_dir, &self.command, self.timeout)?;
        let head = resync_head(&self.repo_dir)?;
        debug!(repo = %self.repo_dir.display(), head = ?head, "fetched repository");
        Ok(FetchOutcome { head, stderr })
    }
}

fn run_fetch(repo_dir: &Path, command: &str, timeout: Duration) -> Result<String, VcsError> {
    let argv = shell_words::split(command).map_err(|err| VcsError::InvalidCommand {
        reason: err.to_string(),
    })?;
    let (program, args) = argv.split_first().ok_or_else(|| VcsError::InvalidCommand {
        reason: "fetch command empty".to_string(),
    })?;

    let mut child = Command::new(program)
        .args(args)
        .current_dir(repo_dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| VcsError::CommandFailed {
            reason: format!("spawn {program}: {err}"),
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        if child
            .try_wait()
            .map_err(|err| VcsError::CommandFailed {
                reason: err.to_string(),
            })?
            .is_some()
        {
            break;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VcsError::Timeout {
                secs: timeout.as_secs(),
            });
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let output = child
        .wait_with_output()
        .map_err(|err| VcsError::CommandFailed {
            reason: err.to_string(),
        })?;
    let stderr = limit_output(output.stderr);
    if !output.status.success() {
        return Err(VcsError::CommandFailed {
            reason: format!("{program} exited with {}: {}", output.status, stderr.trim()),
        });
    }
    Ok(stderr)
}

fn resync_head(repo_dir: &Path) -> Result<Option<String>, VcsError> {
    let repo = gix::open(repo_dir).map_err(|_| VcsError::RepoNotFound)?;
    let head = repo.head().map_err(map_backend_error("read head"))?;
    Ok(head.id().map(|id| id.to_string()))
}

fn map_backend_error<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> VcsError {
    move |err| VcsError::BackendError {
        reason: format!("{context}: {err}"),
    }
}

fn limit_output(mut data: Vec<u8>) -> String {
    data.truncate(OUTPUT_LIMIT);
    String::from_utf8_lossy(&data).into_owned()
}
