use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use utoipa::ToSchema;

/// "Ticket modified" event emitted once per ticket touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TicketNotification {
    pub id: String,
    pub ticket_id: u64,
    pub new_ticket: bool,
    pub modtime: DateTime<Utc>,
    pub summary: String,
    pub status: String,
}

impl TicketNotification {
    pub fn modified(
        ticket_id: u64,
        summary: String,
        status: String,
        modtime: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("ntf_{}", Ulid::new()),
            ticket_id,
            new_ticket: false,
            modtime,
            summary,
            status,
        }
    }
}
