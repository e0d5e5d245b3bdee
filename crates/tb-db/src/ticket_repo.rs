use crate::util::{decode_json, encode_json, from_rfc3339, to_rfc3339};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tb_core::error::TicketError;
use tb_core::mutate;
use tb_core::tickets::TicketRepository;
use tb_core::types::{CreateTicketInput, FieldChange, Ticket, TicketChange, TicketId};

pub const DEFAULT_STATUS: &str = "new";

const TICKET_COLUMNS: &str =
    "id, summary, status, resolution, owner, reporter, created_at, updated_at";

pub struct TicketRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> TicketRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn sql_error(err: &rusqlite::Error) -> TicketError {
    TicketError::InvalidInput {
        message: err.to_string(),
    }
}

impl<'a> TicketRepository for TicketRepo<'a> {
    fn create(&self, input: CreateTicketInput) -> Result<Ticket, TicketError> {
        if input.summary.trim().is_empty() {
            return Err(TicketError::InvalidInput {
                message: "summary must not be empty".to_string(),
            });
        }
        let now = Utc::now();
        let status = input
            .status
            .filter(|status| !status.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string());
        self.conn
            .execute(
                "INSERT INTO tickets (summary, status, resolution, owner, reporter, created_at, updated_at) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?5)",
                params![
                    input.summary,
                    status,
                    input.owner,
                    input.reporter,
                    to_rfc3339(&now)
                ],
            )
            .map_err(|err| sql_error(&err))?;
        let rowid = self.conn.last_insert_rowid();
        let id = TicketId::try_from(rowid).map_err(|err| TicketError::InvalidInput {
            message: err.to_string(),
        })?;
        self.get(id)?.ok_or(TicketError::NotFound)
    }

    fn get(&self, id: TicketId) -> Result<Option<Ticket>, TicketError> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1");
        let row = self
            .conn
            .query_row(&sql, [id.as_i64()], |row| {
                Ok(TicketRow {
                    id: row.get(0)?,
                    summary: row.get(1)?,
                    status: row.get(2)?,
                    resolution: row.get(3)?,
                    owner: row.get(4)?,
                    reporter: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })
            .optional()
            .map_err(|err| sql_error(&err))?;
        row.map(TicketRow::into_ticket).transpose()
    }

    fn changelog(&self, id: TicketId) -> Result<Vec<TicketChange>, TicketError> {
        let mut stmt = self
            .conn
            .prepare("SELECT ticket_id, cnum, at, author, comment, fields_json, permanent FROM ticket_changes WHERE ticket_id = ?1 ORDER BY cnum ASC, id ASC")
            .map_err(|err| sql_error(&err))?;
        let mut rows = stmt.query([id.as_i64()]).map_err(|err| sql_error(&err))?;
        let mut changes = Vec::new();
        while let Some(row) = rows.next().map_err(|err| sql_error(&err))? {
            changes.push(map_change_row(row)?);
        }
        Ok(changes)
    }

    fn count_permanent_changes(&self, id: TicketId) -> Result<i64, TicketError> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM ticket_changes WHERE ticket_id = ?1 AND permanent = 1",
                [id.as_i64()],
                |row| row.get(0),
            )
            .map_err(|err| sql_error(&err))
    }

    fn save_changes(
        &self,
        ticket: &Ticket,
        author: &str,
        comment: &str,
        at: DateTime<Utc>,
        cnum: i64,
    ) -> Result<TicketChange, TicketError> {
        let before = self.get(ticket.id)?.ok_or(TicketError::NotFound)?;
        let fields = mutate::diff(&before, ticket);
        self.conn
            .execute(
                "UPDATE tickets SET summary = ?1, status = ?2, resolution = ?3, owner = ?4, updated_at = ?5 WHERE id = ?6",
                params![
                    ticket.summary,
                    ticket.status,
                    ticket.resolution,
                    ticket.owner,
                    to_rfc3339(&at),
                    ticket.id.as_i64()
                ],
            )
            .map_err(|err| sql_error(&err))?;
        let change = TicketChange {
            ticket_id: ticket.id,
            cnum,
            at,
            author: author.to_string(),
            comment: comment.to_string(),
            fields,
            permanent: true,
        };
        self.conn
            .execute(
                "INSERT INTO ticket_changes (ticket_id, cnum, at, author, comment, fields_json, permanent) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    change.ticket_id.as_i64(),
                    change.cnum,
                    to_rfc3339(&change.at),
                    change.author,
                    change.comment,
                    encode_json(&change.fields)?,
                    change.permanent
                ],
            )
            .map_err(|err| sql_error(&err))?;
        Ok(change)
    }
}

struct TicketRow {
    id: i64,
    summary: String,
    status: String,
    resolution: Option<String>,
    owner: Option<String>,
    reporter: String,
    created_at: String,
    updated_at: String,
}

impl TicketRow {
    fn into_ticket(self) -> Result<Ticket, TicketError> {
        let id = TicketId::try_from(self.id).map_err(|err| TicketError::InvalidInput {
            message: err.to_string(),
        })?;
        Ok(Ticket {
            id,
            summary: self.summary,
            status: self.status,
            resolution: self.resolution,
            owner: self.owner,
            reporter: self.reporter,
            created_at: from_rfc3339(&self.created_at)?,
            updated_at: from_rfc3339(&self.updated_at)?,
        })
    }
}

fn map_change_row(row: &rusqlite::Row<'_>) -> Result<TicketChange, TicketError> {
    let ticket_id: i64 = row.get(0).map_err(|err| sql_error(&err))?;
    let cnum: i64 = row.get(1).map_err(|err| sql_error(&err))?;
    let at: String = row.get(2).map_err(|err| sql_error(&err))?;
    let author: String = row.get(3).map_err(|err| sql_error(&err))?;
    let comment: String = row.get(4).map_err(|err| sql_error(&err))?;
    let fields_json: String = row.get(5).map_err(|err| sql_error(&err))?;
    let permanent: bool = row.get(6).map_err(|err| sql_error(&err))?;

    let ticket_id = TicketId::try_from(ticket_id).map_err(|err| TicketError::InvalidInput {
        message: err.to_string(),
    })?;
    let fields: Vec<FieldChange> = decode_json(&fields_json)?;
    Ok(TicketChange {
        ticket_id,
        cnum,
        at: from_rfc3339(&at)?,
        author,
        comment,
        fields,
        permanent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::with_test_db;

    fn input(summary: &str) -> CreateTicketInput {
        CreateTicketInput {
            summary: summary.to_string(),
            reporter: "qa".to_string(),
            owner: Some("dev".to_string()),
            status: None,
        }
    }

    #[test]
    fn test_create_and_get() {
        let conn = with_test_db().unwrap();
        let repo = TicketRepo::new(&conn);
        let ticket = repo.create(input("Crash on save")).unwrap();
        assert_eq!(ticket.id.get(), 1);
        assert_eq!(ticket.status, DEFAULT_STATUS);
        assert_eq!(repo.get(ticket.id).unwrap(), Some(ticket));
        assert_eq!(repo.get(TicketId::new(99).unwrap()).unwrap(), None);
    }

    #[test]
    fn test_empty_summary_rejected() {
        let conn = with_test_db().unwrap();
        let repo = TicketRepo::new(&conn);
        assert!(matches!(
            repo.create(input("  ")),
            Err(TicketError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_save_changes_records_diff() {
        let conn = with_test_db().unwrap();
        let repo = TicketRepo::new(&conn);
        let mut ticket = repo.create(input("Crash on save")).unwrap();
        ticket.status = "closed".to_string();
        ticket.resolution = Some("fixed".to_string());
        let at = Utc::now();
        let change = repo.save_changes(&ticket, "alice", "Fixes #1", at, 1).unwrap();
        assert_eq!(change.fields.len(), 2);

        let stored = repo.get(ticket.id).unwrap().unwrap();
        assert_eq!(stored.status, "closed");
        assert_eq!(stored.updated_at, at);
        assert_eq!(repo.count_permanent_changes(ticket.id).unwrap(), 1);
        assert_eq!(repo.changelog(ticket.id).unwrap(), vec![change]);
    }

    #[test]
    fn test_save_changes_for_missing_ticket() {
        let conn = with_test_db().unwrap();
        let repo = TicketRepo::new(&conn);
        let mut ticket = repo.create(input("x")).unwrap();
        ticket.id = TicketId::new(7).unwrap();
        assert!(matches!(
            repo.save_changes(&ticket, "a", "c", Utc::now(), 1),
            Err(TicketError::NotFound)
        ));
    }
}
