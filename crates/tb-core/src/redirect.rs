//! Redirect targets for the `/browser` and `/changeset` entry points.

use crate::types::CommitLookup;

const DEFAULT_BRANCH_SEGMENT: &str = "/master";

/// `path` is whatever followed `/browser` in the request. With a `rev` the
/// default branch segment of `browser` is swapped for that revision.
pub fn browser_redirect(browser: &str, path: &str, rev: Option<&str>) -> String {
    let path = path.strip_prefix("/browser").unwrap_or(path);
    match rev.map(str::trim).filter(|rev| !rev.is_empty()) {
        Some(rev) => {
            let base = browser.replacen(DEFAULT_BRANCH_SEGMENT, "/", 1);
            format!("{base}{rev}{path}")
        }
        None => format!("{browser}{path}"),
    }
}

/// `path` is whatever followed `/changeset/`, e.g. `1432` or `eb390eca04/src`.
/// Numeric ids go through `resolve`; a single hit replaces the id with its
/// hash, anything else keeps the id as typed.
pub fn changeset_redirect<F>(browser: &str, path: &str, resolve: F) -> String
where
    F: FnOnce(&str) -> Vec<CommitLookup>,
{
    let path = path.trim_start_matches('/');
    let path = path.strip_prefix("changeset/").unwrap_or(path);
    let id = path.split('/').next().unwrap_or("");
    let base = repository_base(browser);
    if id.is_empty() {
        return browser.to_string();
    }

    let target = if id.bytes().all(|b| b.is_ascii_digit()) {
        match resolve(&format!("r{id}")).as_slice() {
            [hit] => hit.hash.clone(),
            _ => id.to_string(),
        }
    } else {
        id.to_string()
    };
    format!("{base}/commit/{target}")
}

/// `https://github.com/acme/widgets/tree/main` -> `https://github.com/acme/widgets`
pub fn repository_base(browser: &str) -> &str {
    let trimmed = browser.trim_end_matches('/');
    match trimmed.rfind("/tree/") {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    }
}
