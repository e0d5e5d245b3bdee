use crate::backend::VcsError;
use std::path::Path;

pub fn detect_repo(repo_path: &Path) -> Result<(), VcsError> {
    if repo_path.join(".git").exists() || repo_path.join("HEAD").is_file() {
        return Ok(());
    }
    Err(VcsError::RepoNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_worktree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert!(detect_repo(dir.path()).is_ok());
    }

    #[test]
    fn test_detect_bare_repo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("HEAD"), "ref: refs/heads/master\n").unwrap();
        assert!(detect_repo(dir.path()).is_ok());
    }

    #[test]
    fn test_detect_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            detect_repo(dir.path()),
            Err(VcsError::RepoNotFound)
        ));
    }
}
