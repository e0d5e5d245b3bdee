use crate::schema::with_test_db;
use crate::store::DbStore;
use chrono::{DateTime, Utc};
use std::cell::RefCell;
use std::io::Cursor;
use tb_core::error::{BridgeError, NotifyError, TicketError};
use tb_core::hook::{HookOptions, HookProcessor};
use tb_core::links::LinkOptions;
use tb_core::notify::Notifier;
use tb_core::revmap::RevisionMapRepository;
use tb_core::tickets::TicketRepository;
use tb_core::types::{
    CommitAuthor, CommitEvent, CreateTicketInput, PushPayload, PushRepository, RevisionGap, Ticket,
    TicketId,
};
use tb_core::{Bridge, Store};
use tb_events::bus::EventBus;

const HASH_1: &str = "1111111111111111111111111111111111111111";
const HASH_5: &str = "5555555555555555555555555555555555555555";

#[derive(Default)]
struct RecordingNotifier {
    sent: RefCell<Vec<u64>>,
    fail_for: Option<u64>,
}

impl Notifier for RecordingNotifier {
    fn notify(
        &self,
        ticket: &Ticket,
        _new_ticket: bool,
        _modtime: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        if self.fail_for == Some(ticket.id.get()) {
            return Err(NotifyError::Failed {
                message: "mail server down".to_string(),
            });
        }
        self.sent.borrow_mut().push(ticket.id.get());
        Ok(())
    }
}

fn store_with_tickets(count: usize) -> DbStore {
    let store = DbStore::new(with_test_db().unwrap());
    for n in 0..count {
        store
            .tickets()
            .create(CreateTicketInput {
                summary: format!("ticket {n}"),
                reporter: "qa".to_string(),
                owner: Some("dev".to_string()),
                status: Some("assigned".to_string()),
            })
            .unwrap();
    }
    store
}

fn commit(id: &str, message: &str) -> CommitEvent {
    CommitEvent {
        id: id.to_string(),
        message: message.to_string(),
        author: CommitAuthor {
            name: "alice".to_string(),
            ..CommitAuthor::default()
        },
        url: format!("https://github.com/acme/widgets/commit/{id}"),
    }
}

fn options(revmap_enabled: bool) -> HookOptions {
    HookOptions {
        close_status: "closed".to_string(),
        revmap_enabled,
        repo_name: "widgets".to_string(),
    }
}

fn ticket(store: &DbStore, id: u64) -> Ticket {
    store
        .tickets()
        .get(TicketId::new(id).unwrap())
        .unwrap()
        .unwrap()
}

#[test]
fn test_missing_ticket_does_not_block_sibling() {
    let store = store_with_tickets(1);
    let notifier = RecordingNotifier::default();
    let report = HookProcessor::new(&store, &notifier)
        .process(&commit(HASH_1, "Fixes #1 and #2"), &options(false));

    assert_eq!(report.updated, vec![1]);
    assert_eq!(report.skipped, vec![2]);
    assert!(report.failed.is_empty());
    assert_eq!(ticket(&store, 1).status, "closed");
    assert_eq!(*notifier.sent.borrow(), vec![1]);
}

#[test]
fn test_failed_save_rolls_back_only_that_ticket() {
    let conn = with_test_db().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_ticket_two BEFORE INSERT ON ticket_changes
         WHEN NEW.ticket_id = 2
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();
    let store = DbStore::new(conn);
    for n in 1..=2 {
        store
            .tickets()
            .create(CreateTicketInput {
                summary: format!("ticket {n}"),
                reporter: "qa".to_string(),
                owner: Some("dev".to_string()),
                status: Some("assigned".to_string()),
            })
            .unwrap();
    }
    let notifier = RecordingNotifier::default();
    let report = HookProcessor::new(&store, &notifier)
        .process(&commit(HASH_1, "Fixes #2 and #1"), &options(false));

    assert_eq!(report.updated, vec![1]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].ticket_id, 2);
    assert!(report.failed[0].reason.contains("disk full"));
    assert_eq!(ticket(&store, 1).status, "closed");
    assert_eq!(ticket(&store, 2).status, "assigned");
    assert_eq!(ticket(&store, 2).resolution, None);
    assert!(store.tickets().changelog(TicketId::new(2).unwrap()).unwrap().is_empty());
    assert_eq!(*notifier.sent.borrow(), vec![1]);
}

#[test]
fn test_ticket_zero_is_skipped() {
    let store = store_with_tickets(1);
    let notifier = RecordingNotifier::default();
    let report = HookProcessor::new(&store, &notifier)
        .process(&commit(HASH_1, "refs #0"), &options(false));
    assert_eq!(report.skipped, vec![0]);
    assert!(report.updated.is_empty());
}

#[test]
fn test_close_and_return_make_one_change() {
    let store = store_with_tickets(1);
    let notifier = RecordingNotifier::default();
    let message = "Fixes #1. Returns #1.";
    HookProcessor::new(&store, &notifier).process(&commit(HASH_1, message), &options(false));

    let updated = ticket(&store, 1);
    assert_eq!(updated.status, "closed");
    assert_eq!(updated.resolution.as_deref(), Some("fixed"));
    assert_eq!(updated.owner.as_deref(), Some("qa"));

    let changelog = store.tickets().changelog(updated.id).unwrap();
    assert_eq!(changelog.len(), 1);
    assert_eq!(changelog[0].cnum, 1);
    assert_eq!(changelog[0].author, "alice");
    assert_eq!(changelog[0].fields.len(), 3);
    assert!(changelog[0].comment.starts_with("(In [https://github.com/acme/widgets/commit/"));
    assert!(changelog[0].comment.ends_with(message));
    assert_eq!(*notifier.sent.borrow(), vec![1]);
}

#[test]
fn test_reference_only_still_logs_change() {
    let store = store_with_tickets(1);
    let notifier = RecordingNotifier::default();
    HookProcessor::new(&store, &notifier).process(&commit(HASH_1, "see #1"), &options(false));
    let updated = ticket(&store, 1);
    assert_eq!(updated.status, "assigned");
    let changelog = store.tickets().changelog(updated.id).unwrap();
    assert_eq!(changelog.len(), 1);
    assert!(changelog[0].fields.is_empty());
}

#[test]
fn test_reprocessing_without_revmap() {
    let store = store_with_tickets(1);
    let notifier = RecordingNotifier::default();
    let processor = HookProcessor::new(&store, &notifier);
    let event = commit(HASH_1, "fixes #1");
    processor.process(&event, &options(false));
    processor.process(&event, &options(false));

    assert_eq!(store.revmap().count().unwrap(), 0);
    let cnums: Vec<i64> = store
        .tickets()
        .changelog(TicketId::new(1).unwrap())
        .unwrap()
        .iter()
        .map(|change| change.cnum)
        .collect();
    assert_eq!(cnums, vec![1, 2]);
}

#[test]
fn test_revmap_records_commit() {
    let store = store_with_tickets(0);
    let notifier = RecordingNotifier::default();
    let report = HookProcessor::new(&store, &notifier)
        .process(&commit(HASH_5, "no commands here"), &options(true));
    assert!(report.recorded_in_revmap);
    let entries = store.revmap().lookup_by_hash_prefix(&HASH_5[..8]).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].legacy_revision, 0);
    assert_eq!(entries[0].message.as_deref(), Some("no commands here"));
}

#[test]
fn test_failed_notification_is_reported() {
    let store = store_with_tickets(2);
    let notifier = RecordingNotifier {
        fail_for: Some(1),
        ..RecordingNotifier::default()
    };
    let report = HookProcessor::new(&store, &notifier)
        .process(&commit(HASH_1, "closes #1, #2"), &options(false));

    assert_eq!(report.updated, vec![1, 2]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].ticket_id, 1);
    // The write was committed before notifying.
    assert_eq!(ticket(&store, 1).status, "closed");
    assert_eq!(*notifier.sent.borrow(), vec![2]);
}

#[test]
fn test_process_push_aggregates() {
    let store = store_with_tickets(2);
    let notifier = RecordingNotifier::default();
    let payload = PushPayload {
        repository: PushRepository {
            name: "widgets".to_string(),
        },
        commits: vec![commit(HASH_1, "fixes #1"), commit(HASH_5, "refs #2 and #9")],
    };
    let report = HookProcessor::new(&store, &notifier).process_push(&payload, &options(true));
    assert_eq!(report.repository, "widgets");
    assert_eq!(report.commits.len(), 2);
    assert_eq!(report.updated_count(), 2);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(store.revmap().count().unwrap(), 2);
}

fn revmap_input() -> String {
    format!(
        "{HASH_5}\nFifth change\n\ngit-svn-id: https://svn.example.org/repo/trunk@5 6f9c8d4e-0000-0000-0000-000000000000\n\n\
         {HASH_1}\nInitial import\ngit-svn-id: https://svn.example.org/repo/trunk@1 6f9c8d4e-0000-0000-0000-000000000000\n"
    )
}

#[test]
fn test_import_two_entries_with_gap() {
    let bridge = Bridge::new(store_with_tickets(0), EventBus::new(8));
    bridge.revmap().append(0, HASH_1, "stale").unwrap();
    let report = bridge.revmap().import(Cursor::new(revmap_input())).unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.gaps, vec![RevisionGap { newer: 5, older: 1 }]);
    assert_eq!(bridge.revmap().count().unwrap(), 2);
    let entry = bridge.revmap().lookup_by_revision(5).unwrap().unwrap();
    assert_eq!(entry.content_hash, HASH_5);
    assert_eq!(entry.message.as_deref(), Some("Fifth change"));
}

#[test]
fn test_import_error_rolls_back() {
    let bridge = Bridge::new(store_with_tickets(0), EventBus::new(8));
    bridge.revmap().append(3, HASH_1, "kept").unwrap();
    let input = format!("{HASH_5}\nmessage\nnot a marker\n{HASH_1}\n");
    let err = bridge.revmap().import(Cursor::new(input)).unwrap_err();
    assert!(matches!(err, BridgeError::Import(_)));
    assert_eq!(bridge.revmap().count().unwrap(), 1);
    assert!(bridge.revmap().lookup_by_revision(3).unwrap().is_some());
}

#[test]
fn test_needs_import() {
    let bridge = Bridge::new(store_with_tickets(0), EventBus::new(8));
    assert!(!bridge.revmap().needs_import(false).unwrap());
    assert!(bridge.revmap().needs_import(true).unwrap());
    bridge.revmap().append(1, HASH_1, "m").unwrap();
    assert!(!bridge.revmap().needs_import(true).unwrap());
}

#[test]
fn test_bridge_linkify() {
    let bridge = Bridge::new(store_with_tickets(0), EventBus::new(8));
    bridge.revmap().append(5, HASH_5, "Fifth change").unwrap();
    let options = LinkOptions {
        changeset_base: "/changeset".to_string(),
        long_tooltips: false,
        revmap_enabled: true,
    };
    let html = bridge.revmap().linkify("see r5 & r6", &options);
    assert_eq!(
        html,
        format!(
            r#"see <a class="changeset" href="/changeset/{HASH_5}" title="Fifth change">r5</a> &amp; r6"#
        )
    );
}

#[test]
fn test_bridge_tickets_api() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    let bridge = Bridge::new(store_with_tickets(0), bus);
    let created = bridge
        .tickets()
        .create(CreateTicketInput {
            summary: "Crash".to_string(),
            reporter: "qa".to_string(),
            owner: None,
            status: None,
        })
        .unwrap();
    assert!(rx.try_recv().unwrap().new_ticket);
    assert_eq!(bridge.tickets().get(created.id).unwrap(), created);
    assert!(bridge.tickets().changelog(created.id).unwrap().is_empty());

    let missing = TicketId::new(42).unwrap();
    assert!(matches!(
        bridge.tickets().get(missing),
        Err(BridgeError::Ticket(TicketError::NotFound))
    ));
    assert!(matches!(
        bridge.tickets().changelog(missing),
        Err(BridgeError::Ticket(TicketError::NotFound))
    ));
}

#[test]
fn test_bridge_hooks_publish_notifications() {
    let bus = EventBus::new(8);
    let mut rx = bus.subscribe();
    let bridge = Bridge::new(store_with_tickets(1), bus);
    let report = bridge
        .hooks()
        .process(&commit(HASH_1, "Fixes #1"), &options(false));
    assert_eq!(report.updated, vec![1]);
    let notification = rx.try_recv().unwrap();
    assert_eq!(notification.ticket_id, 1);
    assert_eq!(notification.status, "closed");
    assert!(!notification.new_ticket);
}
