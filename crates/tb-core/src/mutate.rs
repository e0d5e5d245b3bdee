use crate::types::{Action, FieldChange, Ticket};

pub const DEFAULT_CLOSE_STATUS: &str = "closed";
pub const FIXED_RESOLUTION: &str = "fixed";

/// Applies one action to the in-memory ticket. Persisting is up to the caller.
pub fn apply(action: Action, ticket: &mut Ticket, close_status: &str) {
    match action {
        Action::Close => close(ticket, close_status),
        Action::Reference => {}
        Action::ReturnToReporter => return_to_reporter(ticket),
    }
}

/// Applies `actions` in order; later actions win per field.
pub fn apply_all(actions: &[Action], ticket: &mut Ticket, close_status: &str) {
    for &action in actions {
        apply(action, ticket, close_status);
    }
}

fn close(ticket: &mut Ticket, close_status: &str) {
    let status = if close_status.trim().is_empty() {
        DEFAULT_CLOSE_STATUS
    } else {
        close_status
    };
    ticket.status = status.to_string();
    ticket.resolution = Some(FIXED_RESOLUTION.to_string());
}

fn return_to_reporter(ticket: &mut Ticket) {
    ticket.owner = Some(ticket.reporter.clone());
}

/// Field-level differences between two versions of a ticket, for the changelog.
pub fn diff(before: &Ticket, after: &Ticket) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if before.status != after.status {
        changes.push(FieldChange {
            field: "status".to_string(),
            old: Some(before.status.clone()),
            new: Some(after.status.clone()),
        });
    }
    if before.resolution != after.resolution {
        changes.push(FieldChange {
            field: "resolution".to_string(),
            old: before.resolution.clone(),
            new: after.resolution.clone(),
        });
    }
    if before.owner != after.owner {
        changes.push(FieldChange {
            field: "owner".to_string(),
            old: before.owner.clone(),
            new: after.owner.clone(),
        });
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TicketId;
    use chrono::Utc;

    fn ticket() -> Ticket {
        let now = Utc::now();
        Ticket {
            id: TicketId::new(1).unwrap(),
            summary: "Crash on save".to_string(),
            status: "assigned".to_string(),
            resolution: None,
            owner: Some("dev".to_string()),
            reporter: "qa".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_close_uses_configured_status() {
        let mut t = ticket();
        apply(Action::Close, &mut t, "resolved");
        assert_eq!(t.status, "resolved");
        assert_eq!(t.resolution.as_deref(), Some("fixed"));
    }

    #[test]
    fn test_close_defaults_to_closed() {
        let mut t = ticket();
        apply(Action::Close, &mut t, "");
        assert_eq!(t.status, "closed");
    }

    #[test]
    fn test_reference_is_noop() {
        let before = ticket();
        let mut t = before.clone();
        apply(Action::Reference, &mut t, "closed");
        assert_eq!(t, before);
        assert!(diff(&before, &t).is_empty());
    }

    #[test]
    fn test_close_then_return_sets_every_field() {
        let mut t = ticket();
        apply_all(
            &[Action::Close, Action::ReturnToReporter],
            &mut t,
            "closed",
        );
        assert_eq!(t.status, "closed");
        assert_eq!(t.resolution.as_deref(), Some("fixed"));
        assert_eq!(t.owner.as_deref(), Some("qa"));
    }

    #[test]
    fn test_diff_lists_changed_fields() {
        let before = ticket();
        let mut after = before.clone();
        apply_all(&[Action::Close, Action::ReturnToReporter], &mut after, "closed");
        let fields: Vec<_> = diff(&before, &after)
            .into_iter()
            .map(|change| change.field)
            .collect();
        assert_eq!(fields, vec!["status", "resolution", "owner"]);
    }
}
