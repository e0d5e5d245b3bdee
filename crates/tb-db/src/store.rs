use rusqlite::Connection;
use tb_core::error::{BridgeError, TicketError};
use tb_core::store::Store;
use tracing::debug;

use crate::revmap_repo::RevmapRepo;
use crate::ticket_repo::TicketRepo;

pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }
}

fn tx_error(err: &rusqlite::Error) -> BridgeError {
    BridgeError::Ticket(TicketError::InvalidInput {
        message: err.to_string(),
    })
}

impl Store for DbStore {
    type Tickets<'a>
        = TicketRepo<'a>
    where
        Self: 'a;
    type Revmap<'a>
        = RevmapRepo<'a>
    where
        Self: 'a;

    fn tickets(&self) -> Self::Tickets<'_> {
        TicketRepo::new(&self.conn)
    }

    fn revmap(&self) -> Self::Revmap<'_> {
        RevmapRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, BridgeError>
    where
        F: FnOnce(&Self) -> Result<T, BridgeError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|err| tx_error(&err))?;
        match f(self) {
            Ok(value) => {
                self.conn
                    .execute_batch("COMMIT")
                    .map_err(|err| tx_error(&err))?;
                Ok(value)
            }
            Err(err) => {
                debug!("rolling back: {err}");
                self.conn
                    .execute_batch("ROLLBACK")
                    .map_err(|rollback_err| tx_error(&rollback_err))?;
                Err(err)
            }
        }
    }
}
