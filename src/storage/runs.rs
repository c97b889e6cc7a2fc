//! Run storage: one summary row per pipeline run.

use rusqlite::{Row, params};
use uuid::Uuid;

use crate::model::RunSummary;

use super::{Result, Storage, StorageError};

impl Storage {
    /// Records a new run. Fails if a run with the same ID exists.
    pub fn record_run(&self, run: &RunSummary) -> Result<()> {
        let conn = self.open_db()?;
        conn.execute(
            "INSERT INTO runs (id, started_at, finished_at, items, batches, present, absent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.id.to_string(),
                run.started_at.to_string(),
                run.finished_at.map(|t| t.to_string()),
                to_sql_count(run.items),
                to_sql_count(run.batches),
                to_sql_count(run.present),
                to_sql_count(run.absent),
            ],
        )?;
        Ok(())
    }

    /// Updates the counts and finish time of a recorded run.
    pub fn update_run(&self, run: &RunSummary) -> Result<()> {
        let conn = self.open_db()?;
        let changed = conn.execute(
            "UPDATE runs SET finished_at = ?2, present = ?3, absent = ?4 WHERE id = ?1",
            params![
                run.id.to_string(),
                run.finished_at.map(|t| t.to_string()),
                to_sql_count(run.present),
                to_sql_count(run.absent),
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::RunNotFound(run.id));
        }
        Ok(())
    }

    /// Lists all runs, oldest first.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let conn = self.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT id, started_at, finished_at, items, batches, present, absent FROM runs",
        )?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut runs = rows
            .into_iter()
            .map(parse_run)
            .collect::<Result<Vec<_>>>()?;
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(runs)
    }
}

type RunRow = (String, String, Option<String>, i64, i64, i64, i64);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RunRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn parse_run(
    (id, started_at, finished_at, items, batches, present, absent): RunRow,
) -> Result<RunSummary> {
    let id = id
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid run id: {e}")))?;
    let started_at = parse_timestamp(&started_at, "started_at")?;
    let finished_at = finished_at
        .map(|t| parse_timestamp(&t, "finished_at"))
        .transpose()?;
    Ok(RunSummary {
        id,
        started_at,
        finished_at,
        items: from_sql_count(items)?,
        batches: from_sql_count(batches)?,
        present: from_sql_count(present)?,
        absent: from_sql_count(absent)?,
    })
}

fn parse_timestamp(s: &str, column: &str) -> Result<jiff::Timestamp> {
    s.parse()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

fn to_sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn from_sql_count(n: i64) -> Result<usize> {
    usize::try_from(n).map_err(|_| StorageError::Corrupt(format!("negative count: {n}")))
}
