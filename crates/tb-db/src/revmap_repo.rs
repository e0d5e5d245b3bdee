use crate::util::revision_from_sql;
use rusqlite::{Connection, params};
use tb_core::error::RevmapError;
use tb_core::revmap::{HASH_LOOKUP_LIMIT, RevisionMapRepository};
use tb_core::types::RevisionEntry;

pub struct RevmapRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> RevmapRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query_entries(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<RevisionEntry>, RevmapError> {
        let mut stmt = self.conn.prepare(sql).map_err(|err| sql_error(&err))?;
        let mut rows = stmt.query(params).map_err(|err| sql_error(&err))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().map_err(|err| sql_error(&err))? {
            entries.push(map_entry_row(row)?);
        }
        Ok(entries)
    }
}

fn sql_error(err: &rusqlite::Error) -> RevmapError {
    RevmapError::InvalidInput {
        message: err.to_string(),
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl<'a> RevisionMapRepository for RevmapRepo<'a> {
    fn append(&self, legacy_revision: u32, hash: &str, message: &str) -> Result<(), RevmapError> {
        self.conn
            .execute(
                "INSERT INTO revmap (legacy_revision, content_hash, commit_msg) VALUES (?1, ?2, ?3)",
                params![legacy_revision, hash, message],
            )
            .map_err(|err| sql_error(&err))?;
        Ok(())
    }

    fn list_by_revision(
        &self,
        legacy_revision: u32,
        limit: usize,
    ) -> Result<Vec<RevisionEntry>, RevmapError> {
        self.query_entries(
            "SELECT legacy_revision, content_hash, commit_msg FROM revmap WHERE legacy_revision = ?1 ORDER BY rowid ASC LIMIT ?2",
            params![legacy_revision, sql_limit(limit)],
        )
    }

    fn find_by_hash_prefix(&self, prefix: &str) -> Result<Vec<RevisionEntry>, RevmapError> {
        // Prefix is validated hex, so LIKE wildcards cannot appear in it.
        self.query_entries(
            "SELECT legacy_revision, content_hash, commit_msg FROM revmap WHERE content_hash LIKE ?1 || '%' ORDER BY rowid ASC LIMIT ?2",
            params![prefix, sql_limit(HASH_LOOKUP_LIMIT)],
        )
    }

    fn count(&self) -> Result<u64, RevmapError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM revmap", [], |row| row.get(0))
            .map_err(|err| sql_error(&err))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn clear(&self) -> Result<(), RevmapError> {
        self.conn
            .execute("DELETE FROM revmap", [])
            .map_err(|err| sql_error(&err))?;
        Ok(())
    }
}

fn map_entry_row(row: &rusqlite::Row<'_>) -> Result<RevisionEntry, RevmapError> {
    let legacy_revision: i64 = row.get(0).map_err(|err| sql_error(&err))?;
    let content_hash: String = row.get(1).map_err(|err| sql_error(&err))?;
    let message: Option<String> = row.get(2).map_err(|err| sql_error(&err))?;
    Ok(RevisionEntry {
        legacy_revision: revision_from_sql(legacy_revision)?,
        content_hash,
        message,
    })
}
