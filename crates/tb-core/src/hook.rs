use crate::BridgeError;
use crate::commands;
use crate::mutate;
use crate::notify::Notifier;
use crate::revmap::RevisionMapRepository;
use crate::store::Store;
use crate::tickets::TicketRepository;
use crate::types::revmap::NO_LEGACY_REVISION;
use crate::types::{Action, CommitEvent, PushPayload, Ticket, TicketId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

/// Per-delivery settings, derived from the `[github]` config table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOptions {
    pub close_status: String,
    pub revmap_enabled: bool,
    pub repo_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TicketFailure {
    pub ticket_id: u64,
    pub reason: String,
}

/// What happened to one commit. Only used for logging and the CLI; the
/// webhook caller never sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct HookReport {
    pub commit: String,
    pub recorded_in_revmap: bool,
    pub updated: Vec<u64>,
    pub skipped: Vec<u64>,
    pub failed: Vec<TicketFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct PushReport {
    pub repository: String,
    pub commits: Vec<HookReport>,
}

impl PushReport {
    pub fn updated_count(&self) -> usize {
        self.commits.iter().map(|c| c.updated.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.commits.iter().map(|c| c.failed.len()).sum()
    }
}

enum TicketOutcome {
    Updated(Ticket),
    Skipped,
}

pub struct HookProcessor<'a, S: Store, N: Notifier> {
    store: &'a S,
    notifier: &'a N,
}

impl<'a, S: Store, N: Notifier> HookProcessor<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N) -> Self {
        Self { store, notifier }
    }

    pub fn process_push(&self, payload: &PushPayload, options: &HookOptions) -> PushReport {
        let commits = payload
            .commits
            .iter()
            .map(|commit| self.process(commit, options))
            .collect();
        PushReport {
            repository: payload.repository.name.clone(),
            commits,
        }
    }

    pub fn process(&self, commit: &CommitEvent, options: &HookOptions) -> HookReport {
        debug!(commit = %commit.id, repo = %options.repo_name, "processing commit");
        let mut report = HookReport {
            commit: commit.id.clone(),
            ..HookReport::default()
        };

        if options.revmap_enabled {
            match self
                .store
                .revmap()
                .append(NO_LEGACY_REVISION, &commit.id, &commit.message)
            {
                Ok(()) => report.recorded_in_revmap = true,
                Err(err) => warn!(commit = %commit.id, "revmap append failed: {err}"),
            }
        }

        let message = commit.display_message();
        let author = commit.author.name.as_str();
        let timestamp = Utc::now();

        for (ticket_id, actions) in group_by_ticket(&message) {
            debug!(ticket = ticket_id, ?actions, "applying commands");
            match self.apply_to_ticket(ticket_id, &actions, author, &message, timestamp, options) {
                Ok(TicketOutcome::Updated(ticket)) => {
                    report.updated.push(ticket_id);
                    if let Err(err) = self.notifier.notify(&ticket, false, timestamp) {
                        error!(
                            ticket = ticket_id,
                            commit = %commit.id,
                            repo = %options.repo_name,
                            "notification failed: {err}"
                        );
                        report.failed.push(TicketFailure {
                            ticket_id,
                            reason: err.to_string(),
                        });
                    }
                }
                Ok(TicketOutcome::Skipped) => {
                    warn!(ticket = ticket_id, commit = %commit.id, "ticket not found, skipping");
                    report.skipped.push(ticket_id);
                }
                Err(err) => {
                    error!(
                        ticket = ticket_id,
                        commit = %commit.id,
                        repo = %options.repo_name,
                        "unexpected error while processing ticket: {err}"
                    );
                    report.failed.push(TicketFailure {
                        ticket_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if !report.updated.is_empty() {
            info!(
                commit = %commit.short_id(),
                tickets = ?report.updated,
                "updated tickets from commit"
            );
        }
        report
    }

    fn apply_to_ticket(
        &self,
        ticket_id: u64,
        actions: &[Action],
        author: &str,
        comment: &str,
        at: DateTime<Utc>,
        options: &HookOptions,
    ) -> Result<TicketOutcome, BridgeError> {
        let Ok(id) = TicketId::new(ticket_id) else {
            return Ok(TicketOutcome::Skipped);
        };
        self.store.with_tx(|store| {
            let tickets = store.tickets();
            let Some(mut ticket) = tickets.get(id)? else {
                return Ok(TicketOutcome::Skipped);
            };
            mutate::apply_all(actions, &mut ticket, &options.close_status);
            let cnum = tickets.count_permanent_changes(id)? + 1;
            tickets.save_changes(&ticket, author, comment, at, cnum)?;
            ticket.updated_at = at;
            Ok(TicketOutcome::Updated(ticket))
        })
    }
}

/// Commands grouped per ticket, actions kept in extraction order. Tickets
/// come out in first-mention order.
pub fn group_by_ticket(message: &str) -> Vec<(u64, Vec<Action>)> {
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut groups: Vec<(u64, Vec<Action>)> = Vec::new();
    for command in commands::parse(message) {
        match index.get(&command.ticket_id) {
            Some(&slot) => groups[slot].1.push(command.action),
            None => {
                index.insert(command.ticket_id, groups.len());
                groups.push((command.ticket_id, vec![command.action]));
            }
        }
    }
    groups
}
