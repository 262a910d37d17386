use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, SubsecRound};
use rusqlite::types::{FromSql, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

/// Format used for the start and end columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single task, saved as an entry in the tasks table.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: i64,
    pub user: String,
    pub description: String,
    pub start: Timestamp,
    pub end: Option<Timestamp>,
}

/// A start or end column as read back. Rows this program did not write may
/// hold text that is not a timestamp; it is kept as is for display.
#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl Timestamp {
    pub fn time(&self) -> Option<NaiveDateTime> {
        match self {
            Timestamp::Parsed(time) => Some(*time),
            Timestamp::Raw(_) => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Parsed(time) => write!(f, "{}", time.format(TIMESTAMP_FORMAT)),
            Timestamp::Raw(text) => f.write_str(text),
        }
    }
}

/// Errors the user can recover from. Anything else coming out of the
/// store is a storage failure.
#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("Please, fill in all fields!")]
    EmptyField,
    #[error("No task selected!")]
    NoSelection,
    #[error("Task {0} does not exist.")]
    NotFound(i64),
    #[error("Task {0} has already ended.")]
    AlreadyEnded(i64),
}

impl Task {
    pub fn is_ended(&self) -> bool {
        self.end.is_some()
    }

    pub fn fmt_start(&self) -> String {
        self.start.to_string()
    }

    /// The end timestamp, or an empty string while the task is open.
    pub fn fmt_end(&self) -> String {
        self.end.as_ref().map(Timestamp::to_string).unwrap_or_default()
    }
}

/// Owns the connection to the task database.
pub struct Store {
    db: Connection,
}

impl Store {
    /// Open the database at `path`, creating the file and the tasks
    /// table if they do not exist.
    pub fn open(path: &Path) -> Result<Store> {
        let db = Connection::open(path)
            .with_context(|| format!("Failed to open database {}.", path.display()))?;
        let store = Store { db };
        store.initialize()?;
        Ok(store)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Store> {
        let db = Connection::open_in_memory().context("Failed to open in-memory database.")?;
        let store = Store { db };
        store.initialize()?;
        Ok(store)
    }

    /// Create the tasks table. Safe to call on every startup.
    pub fn initialize(&self) -> Result<()> {
        self.db
            .execute(
                "CREATE TABLE IF NOT EXISTS tasks (
                  id              INTEGER PRIMARY KEY AUTOINCREMENT,
                  user            TEXT,
                  description     TEXT,
                  start           TEXT,
                  \"end\"           TEXT
                  )",
                [],
            )
            .context("Failed to create tasks table.")?;
        Ok(())
    }

    /// Insert a new open task and return the id the database assigned to it.
    pub fn insert(&self, user: &str, description: &str, start: NaiveDateTime) -> Result<i64> {
        self.db
            .execute(
                "INSERT INTO tasks (user, description, start, \"end\") VALUES (?1, ?2, ?3, NULL)",
                params![user, description, format_timestamp(&start)],
            )
            .context("Failed to insert task to database.")?;
        let id = self.db.last_insert_rowid();
        tracing::info!(id, user, "task started");
        Ok(id)
    }

    /// Set the end timestamp of a task. Fails with `TaskError::NotFound` if
    /// there is no such task and with `TaskError::AlreadyEnded` if it was
    /// ended before; the row is left untouched in both cases.
    pub fn update_end(&self, id: i64, end: NaiveDateTime) -> Result<()> {
        // end is an SQL keyword, hence the quoting.
        let changed = self
            .db
            .execute(
                "UPDATE tasks SET \"end\" = ?1 WHERE id = ?2 AND \"end\" IS NULL",
                params![format_timestamp(&end), id],
            )
            .context("Failed to end task in the database.")?;

        if changed == 0 {
            let existing = self
                .db
                .query_row("SELECT id FROM tasks WHERE id = ?1", params![id], |row| {
                    row.get::<_, i64>(0)
                })
                .optional()
                .context("Failed to look up task in the database.")?;
            return match existing {
                Some(_) => Err(TaskError::AlreadyEnded(id).into()),
                None => Err(TaskError::NotFound(id).into()),
            };
        }

        tracing::info!(id, "task ended");
        Ok(())
    }

    /// All tasks, in insertion order.
    pub fn list_all(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, user, description, start, \"end\" FROM tasks ORDER BY id")
            .context("Failed to fetch tasks from database.")?;
        let mapped_rows = stmt
            .query_map([], task_from_row)
            .context("Failed to fetch tasks from database.")?;

        let mut tasks = Vec::new();
        for task in mapped_rows {
            tasks.push(task.context("Failed to read task row.")?);
        }
        Ok(tasks)
    }

    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        let task = self
            .db
            .query_row(
                "SELECT id, user, description, start, \"end\" FROM tasks WHERE id = ?1",
                params![id],
                task_from_row,
            )
            .optional()
            .with_context(|| format!("Failed to fetch task {} from database.", id))?;
        Ok(task)
    }

    /// Release the connection, reporting any error the database raises on close.
    pub fn close(self) -> Result<()> {
        self.db
            .close()
            .map_err(|(_, err)| err)
            .context("Failed to close database.")
    }
}

/// Return a task from a row in this order: [id, user, description, start, end].
/// Only the id has to be well formed. NULL text columns read back as empty
/// strings, and a start or end that does not parse is kept as raw text.
pub fn task_from_row(row: &Row) -> rusqlite::Result<Task> {
    let id: i64 = row.get(0)?;
    let start = match timestamp_column(row, 3)? {
        Some(start) => start,
        None => {
            tracing::warn!(id, "task has no start timestamp");
            Timestamp::Raw(String::new())
        }
    };
    Ok(Task {
        id,
        user: text_of(row.get_ref(1)?),
        description: text_of(row.get_ref(2)?),
        start,
        end: timestamp_column(row, 4)?,
    })
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    let value = row.get_ref(idx)?;
    if let ValueRef::Null = value {
        return Ok(None);
    }
    match NaiveDateTime::column_result(value) {
        Ok(time) => Ok(Some(Timestamp::Parsed(time))),
        Err(_) => {
            let raw = text_of(value);
            tracing::warn!(column = idx, value = %raw, "not a timestamp, keeping the stored text");
            Ok(Some(Timestamp::Raw(raw)))
        }
    }
}

fn text_of(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Return the current local time, with seconds precision.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Trim both fields and reject the pair if either ends up empty.
pub fn validate_fields<'a>(user: &'a str, description: &'a str) -> Result<(&'a str, &'a str), TaskError> {
    let user = user.trim();
    let description = description.trim();
    if user.is_empty() || description.is_empty() {
        return Err(TaskError::EmptyField);
    }
    Ok((user, description))
}
