use crate::error::TicketError;
use crate::types::{CreateTicketInput, Ticket, TicketChange, TicketId};
use chrono::{DateTime, Utc};

pub trait TicketRepository {
    fn create(&self, input: CreateTicketInput) -> Result<Ticket, TicketError>;
    fn get(&self, id: TicketId) -> Result<Option<Ticket>, TicketError>;
    fn changelog(&self, id: TicketId) -> Result<Vec<TicketChange>, TicketError>;
    fn count_permanent_changes(&self, id: TicketId) -> Result<i64, TicketError>;
    /// Writes the ticket's fields and one changelog entry numbered `cnum`.
    fn save_changes(
        &self,
        ticket: &Ticket,
        author: &str,
        comment: &str,
        at: DateTime<Utc>,
        cnum: i64,
    ) -> Result<TicketChange, TicketError>;
}
