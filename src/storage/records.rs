//! Record storage: per-item puts and full scans.
//!
//! Records are keyed by an identifier chosen by the caller (usually a field of
//! the record such as `link`). Putting an existing key replaces its record but
//! keeps its original position in scans.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::model::ResultRecord;

use super::{Result, Storage};

const UPSERT: &str = "INSERT INTO records (key, run_id, record, stored_at)
     VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT(key) DO UPDATE
     SET run_id = excluded.run_id, record = excluded.record, stored_at = excluded.stored_at";

impl Storage {
    /// Stores keyed records in one transaction. Returns how many were written.
    pub fn put_records<'a, I>(&self, run_id: Uuid, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a ResultRecord)>,
    {
        let mut conn = self.open_db()?;
        let tx = conn.transaction()?;
        let mut stored = 0;
        for (key, record) in entries {
            upsert(&tx, run_id, key, record)?;
            stored += 1;
        }
        tx.commit()?;
        Ok(stored)
    }

    /// Loads a single record by key.
    pub fn get_record(&self, key: &str) -> Result<Option<ResultRecord>> {
        let conn = self.open_db()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT record FROM records WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Loads every record, in insertion order. Restricted to one run when
    /// `run_id` is given.
    pub fn scan_records(&self, run_id: Option<Uuid>) -> Result<Vec<ResultRecord>> {
        let conn = self.open_db()?;
        let json_rows: Vec<String> = match run_id {
            Some(id) => conn
                .prepare("SELECT record FROM records WHERE run_id = ?1 ORDER BY seq")?
                .query_map(params![id.to_string()], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?,
            None => conn
                .prepare("SELECT record FROM records ORDER BY seq")?
                .query_map([], |row| row.get(0))?
                .collect::<rusqlite::Result<_>>()?,
        };
        json_rows
            .iter()
            .map(|json| Ok(serde_json::from_str(json)?))
            .collect()
    }
}

fn upsert(conn: &Connection, run_id: Uuid, key: &str, record: &ResultRecord) -> Result<()> {
    let json = serde_json::to_string(record)?;
    conn.execute(
        UPSERT,
        params![key, run_id.to_string(), json, Timestamp::now().to_string()],
    )?;
    Ok(())
}
