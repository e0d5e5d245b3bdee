use crate::error::{BridgeError, TicketError};
use crate::hook::{HookOptions, HookProcessor, HookReport, PushReport};
use crate::links::{self, LinkOptions};
use crate::notify::Notifier;
use crate::revmap::RevisionMapRepository;
use crate::revmap_import;
use crate::store::Store;
use crate::tickets::TicketRepository;
use crate::types::{
    CommitEvent, CommitLookup, CreateTicketInput, ImportReport, PushPayload, RevisionEntry,
    Ticket, TicketChange, TicketId,
};
use std::io::BufRead;
use tracing::warn;

pub struct Bridge<S: Store, N: Notifier> {
    store: S,
    notifier: N,
}

impl<S: Store, N: Notifier> Bridge<S, N> {
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub fn hooks(&self) -> HooksApi<'_, S, N> {
        HooksApi { core: self }
    }

    pub fn revmap(&self) -> RevmapApi<'_, S, N> {
        RevmapApi { core: self }
    }

    pub fn tickets(&self) -> TicketsApi<'_, S, N> {
        TicketsApi { core: self }
    }

    fn processor(&self) -> HookProcessor<'_, S, N> {
        HookProcessor::new(&self.store, &self.notifier)
    }
}

pub struct HooksApi<'a, S: Store, N: Notifier> {
    core: &'a Bridge<S, N>,
}

impl<'a, S: Store, N: Notifier> HooksApi<'a, S, N> {
    pub fn process(&self, commit: &CommitEvent, options: &HookOptions) -> HookReport {
        self.core.processor().process(commit, options)
    }

    pub fn process_push(&self, payload: &PushPayload, options: &HookOptions) -> PushReport {
        self.core.processor().process_push(payload, options)
    }
}

pub struct RevmapApi<'a, S: Store, N: Notifier> {
    core: &'a Bridge<S, N>,
}

impl<'a, S: Store, N: Notifier> RevmapApi<'a, S, N> {
    pub fn append(&self, legacy_revision: u32, hash: &str, message: &str) -> Result<(), BridgeError> {
        self.core
            .store
            .revmap()
            .append(legacy_revision, hash, message)
            .map_err(BridgeError::from)
    }

    pub fn lookup_by_revision(&self, legacy_revision: u32) -> Result<Option<RevisionEntry>, BridgeError> {
        self.core
            .store
            .revmap()
            .lookup_by_revision(legacy_revision)
            .map_err(BridgeError::from)
    }

    pub fn lookup_by_hash_prefix(&self, prefix: &str) -> Result<Vec<RevisionEntry>, BridgeError> {
        self.core
            .store
            .revmap()
            .lookup_by_hash_prefix(prefix)
            .map_err(BridgeError::from)
    }

    pub fn resolve(&self, reference: &str) -> Result<Vec<CommitLookup>, BridgeError> {
        self.core
            .store
            .revmap()
            .resolve(reference)
            .map_err(BridgeError::from)
    }

    pub fn count(&self) -> Result<u64, BridgeError> {
        self.core.store.revmap().count().map_err(BridgeError::from)
    }

    pub fn import<R: BufRead>(&self, reader: R) -> Result<ImportReport, BridgeError> {
        revmap_import::import(&self.core.store, reader)
    }

    /// True when the revmap is in use but has never been loaded.
    pub fn needs_import(&self, enabled: bool) -> Result<bool, BridgeError> {
        if !enabled {
            return Ok(false);
        }
        Ok(self.count()? == 0)
    }

    /// Lookup failures degrade to plain text.
    pub fn linkify(&self, text: &str, options: &LinkOptions) -> String {
        let revmap = self.core.store.revmap();
        links::linkify(text, options, |reference| {
            revmap.resolve(reference).unwrap_or_else(|err| {
                warn!(reference, "revmap lookup failed: {err}");
                Vec::new()
            })
        })
    }
}

pub struct TicketsApi<'a, S: Store, N: Notifier> {
    core: &'a Bridge<S, N>,
}

impl<'a, S: Store, N: Notifier> TicketsApi<'a, S, N> {
    pub fn create(&self, input: CreateTicketInput) -> Result<Ticket, BridgeError> {
        let ticket = self
            .core
            .store
            .with_tx(|store| Ok(store.tickets().create(input)?))?;
        if let Err(err) = self
            .core
            .notifier
            .notify(&ticket, true, ticket.created_at)
        {
            warn!(ticket = ticket.id.get(), "notification failed: {err}");
        }
        Ok(ticket)
    }

    pub fn get(&self, id: TicketId) -> Result<Ticket, BridgeError> {
        self.core
            .store
            .tickets()
            .get(id)?
            .ok_or(BridgeError::Ticket(TicketError::NotFound))
    }

    pub fn changelog(&self, id: TicketId) -> Result<Vec<TicketChange>, BridgeError> {
        let tickets = self.core.store.tickets();
        if tickets.get(id)?.is_none() {
            return Err(TicketError::NotFound.into());
        }
        tickets.changelog(id).map_err(BridgeError::from)
    }
}
