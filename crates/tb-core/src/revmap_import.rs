//! Bulk load of the legacy revision map from a git-svn `git log`, newest first.

use crate::BridgeError;
use crate::error::ImportError;
use crate::revmap::{FULL_HASH_LEN, RevisionMapRepository, is_full_hash};
use crate::store::Store;
use crate::types::{ImportReport, RevisionEntry, RevisionGap};
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;
use tracing::{debug, info};

pub const MARKER_PREFIX: &str = "git-svn-id:";
pub const EMPTY_MESSAGE: &str = "<no commit message>";

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^git-svn-id:.*@(\d+) ").expect("marker pattern compiles"));

enum State {
    ExpectHash,
    ExpectMessageOrMarker { hash: String },
    ExpectMarker { hash: String, message: String },
    Done,
}

/// Lazily turns revmap lines into entries. After the first error the
/// iterator is exhausted.
pub struct RevmapParser<I> {
    lines: I,
    line_no: usize,
    state: State,
    last_revision: Option<u32>,
}

impl<I> RevmapParser<I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            line_no: 0,
            state: State::ExpectHash,
            last_revision: None,
        }
    }

    fn next_line(&mut self) -> Result<Option<String>, ImportError> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        self.line_no += 1;
        Ok(Some(line?.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn step(&mut self) -> Result<Option<RevisionEntry>, ImportError> {
        loop {
            let state = std::mem::replace(&mut self.state, State::Done);
            if matches!(state, State::Done) {
                return Ok(None);
            }
            let line = self.next_line()?;
            match (state, line) {
                (State::Done, _) => return Ok(None),
                (State::ExpectHash, None) => {
                    return Err(ImportError::UnexpectedEof {
                        last: self.last_revision.unwrap_or(0),
                    });
                }
                (State::ExpectHash, Some(line)) if line.trim().is_empty() => {
                    self.state = State::ExpectHash;
                }
                (State::ExpectHash, Some(line)) => {
                    if !is_hash_line(&line) {
                        return Err(ImportError::ExpectedHash {
                            line: self.line_no,
                            found: line,
                        });
                    }
                    self.state = State::ExpectMessageOrMarker {
                        hash: line[..FULL_HASH_LEN].to_string(),
                    };
                }
                (State::ExpectMessageOrMarker { .. } | State::ExpectMarker { .. }, None) => {
                    return Err(ImportError::ExpectedMarker {
                        line: self.line_no + 1,
                        found: "<end of input>".to_string(),
                    });
                }
                (State::ExpectMessageOrMarker { hash }, Some(line)) => {
                    if line.starts_with(MARKER_PREFIX) {
                        return self.emit(hash, EMPTY_MESSAGE.to_string(), &line).map(Some);
                    }
                    self.state = self.push_message_line(hash, String::new(), line)?;
                }
                (State::ExpectMarker { hash, message }, Some(line)) => {
                    if line.starts_with(MARKER_PREFIX) {
                        let message = if message.is_empty() {
                            EMPTY_MESSAGE.to_string()
                        } else {
                            message
                        };
                        return self.emit(hash, message, &line).map(Some);
                    }
                    self.state = self.push_message_line(hash, message, line)?;
                }
            }
        }
    }

    /// Message lines are joined with single spaces; blank lines vanish.
    fn push_message_line(&self, hash: String, mut message: String, line: String) -> Result<State, ImportError> {
        if is_hash_line(&line) {
            return Err(ImportError::ExpectedMarker {
                line: self.line_no,
                found: line,
            });
        }
        let text = line.trim();
        if !text.is_empty() {
            if !message.is_empty() {
                message.push(' ');
            }
            message.push_str(text);
        }
        Ok(State::ExpectMarker { hash, message })
    }

    fn emit(&mut self, hash: String, message: String, marker: &str) -> Result<RevisionEntry, ImportError> {
        let bad_marker = || ImportError::BadMarker {
            line: self.line_no,
            found: marker.to_string(),
        };
        let caps = MARKER_RE.captures(marker).ok_or_else(bad_marker)?;
        let revision = caps[1].parse::<u32>().map_err(|_| bad_marker())?;
        self.last_revision = Some(revision);
        self.state = if revision == 1 {
            State::Done
        } else {
            State::ExpectHash
        };
        Ok(RevisionEntry::new(revision, hash, message))
    }
}

impl<I> Iterator for RevmapParser<I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    type Item = Result<RevisionEntry, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => None,
            Err(err) => {
                self.state = State::Done;
                Some(Err(err))
            }
        }
    }
}

fn is_hash_line(line: &str) -> bool {
    line.get(..FULL_HASH_LEN).is_some_and(is_full_hash)
}

/// Replaces the whole revmap with the entries read from `reader`. Runs in
/// one transaction: a format error leaves the previous table untouched.
pub fn import<S: Store, R: BufRead>(store: &S, reader: R) -> Result<ImportReport, BridgeError> {
    store.with_tx(|store| {
        let revmap = store.revmap();
        revmap.clear()?;
        let mut report = ImportReport::default();
        let mut previous: Option<u32> = None;
        for entry in RevmapParser::new(reader.lines()) {
            let entry = entry?;
            let revision = entry.legacy_revision;
            revmap.append(
                revision,
                &entry.content_hash,
                entry.message.as_deref().unwrap_or(EMPTY_MESSAGE),
            )?;
            if let Some(newer) = previous {
                if newer.checked_sub(1) != Some(revision) {
                    debug!("found a gap between r{newer} and r{revision}");
                    report.gaps.push(RevisionGap {
                        newer,
                        older: revision,
                    });
                }
            }
            previous = Some(revision);
            report.inserted += 1;
        }
        info!(inserted = report.inserted, gaps = report.gaps.len(), "imported revmap");
        Ok(report)
    })
}
