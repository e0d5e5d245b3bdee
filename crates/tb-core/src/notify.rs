use crate::error::NotifyError;
use crate::types::Ticket;
use chrono::{DateTime, Utc};
use tb_events::bus::EventBus;
use tb_events::types::TicketNotification;
use tracing::debug;

/// Sink for "ticket modified" events.
pub trait Notifier {
    fn notify(
        &self,
        ticket: &Ticket,
        new_ticket: bool,
        modtime: DateTime<Utc>,
    ) -> Result<(), NotifyError>;
}

impl Notifier for EventBus {
    fn notify(
        &self,
        ticket: &Ticket,
        new_ticket: bool,
        modtime: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        let mut notification = TicketNotification::modified(
            ticket.id.get(),
            ticket.summary.clone(),
            ticket.status.clone(),
            modtime,
        );
        notification.new_ticket = new_ticket;
        // Nobody listening is not a failure.
        if let Err(err) = self.publish(notification) {
            debug!(ticket = ticket.id.get(), "notification dropped: {err}");
        }
        Ok(())
    }
}
