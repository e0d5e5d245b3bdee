pub mod command;
pub mod commit;
pub mod ids;
pub mod revmap;
pub mod ticket;

pub use command::{Action, Command};
pub use commit::{CommitAuthor, CommitEvent, PushPayload, PushRepository};
pub use ids::{IdError, TicketId};
pub use revmap::{CommitLookup, ImportReport, RevisionEntry, RevisionGap};
pub use ticket::{CreateTicketInput, FieldChange, Ticket, TicketChange};
