use crate::BridgeError;
use crate::revmap::RevisionMapRepository;
use crate::tickets::TicketRepository;

pub trait Store {
    type Tickets<'a>: TicketRepository
    where
        Self: 'a;
    type Revmap<'a>: RevisionMapRepository
    where
        Self: 'a;

    fn tickets(&self) -> Self::Tickets<'_>;
    fn revmap(&self) -> Self::Revmap<'_>;

    fn with_tx<F, T>(&self, f: F) -> Result<T, BridgeError>
    where
        F: FnOnce(&Self) -> Result<T, BridgeError>;
}
