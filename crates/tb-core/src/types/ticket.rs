use crate::types::ids::TicketId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    pub id: TicketId,
    pub summary: String,
    pub status: String,
    pub resolution: Option<String>,
    pub owner: Option<String>,
    pub reporter: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketInput {
    pub summary: String,
    pub reporter: String,
    pub owner: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// One changelog entry. `cnum` numbers the permanent entries of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TicketChange {
    pub ticket_id: TicketId,
    pub cnum: i64,
    pub at: DateTime<Utc>,
    pub author: String,
    pub comment: String,
    pub fields: Vec<FieldChange>,
    pub permanent: bool,
}
