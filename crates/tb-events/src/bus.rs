use crate::types::TicketNotification;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TicketNotification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TicketNotification> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers that received the notification.
    pub fn publish(
        &self,
        notification: TicketNotification,
    ) -> Result<usize, broadcast::error::SendError<TicketNotification>> {
        self.sender.send(notification)
    }
}
