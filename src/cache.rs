use crate::error::{Result, TrendError};
use gix::ObjectId;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const STORE_SCHEMA_VERSION: i64 = 1;

/// SQLite file mapping blob ids to line counts, shared between runs.
pub struct LineStore {
    conn: Connection,
}

impl LineStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path.as_ref())?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS blob_lines (
                id TEXT PRIMARY KEY,
                lines INTEGER NOT NULL
            );
            ",
        )?;
        self.check_schema_version()?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {STORE_SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != STORE_SCHEMA_VERSION {
            return Err(TrendError::Cache(format!(
                "Schema version mismatch: expected {}, found {}",
                STORE_SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    pub fn get(&self, id: &ObjectId) -> Result<Option<u64>> {
        let lines: Option<i64> = self
            .conn
            .query_row(
                "SELECT lines FROM blob_lines WHERE id = ?",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(lines.map(|l| l as u64))
    }

    /// Insert counts in one transaction. Existing ids are left untouched.
    pub fn insert_many(&mut self, counts: &[(ObjectId, u64)]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut insert_stmt =
                tx.prepare("INSERT OR IGNORE INTO blob_lines (id, lines) VALUES (?, ?)")?;
            for (id, lines) in counts {
                written += insert_stmt.execute(params![id.to_string(), *lines as i64])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    #[cfg(test)]
    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM blob_lines", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
