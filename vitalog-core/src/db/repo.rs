//! Event store repository
//!
//! Provides append, update and query operations over the events table.
//! Events are mutated in place only by the sleep merge; every other write
//! path is append-only.

use crate::error::{Error, Result};
use crate::types::Event;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::PathBuf;
use std::sync::Mutex;

/// Query filter for [`Database::list_events`].
///
/// All fields are optional; unset fields do not constrain the query.
#[derive(Debug, Default)]
pub struct EventFilter {
    /// Filter by source integration
    pub source: Option<String>,
    /// Filter by a single event type
    pub event_type: Option<String>,
    /// Filter by a set of event types (OR)
    pub event_types: Option<Vec<String>>,
    /// Keep events created at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of events to return
    pub limit: Option<usize>,
    /// Sort oldest-first instead of the default newest-first
    pub ascending: bool,
}

/// Database handle (single connection guarded by a mutex)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL mode: pollers and the ingest path share this store
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Event operations
    // ============================================

    /// Append an event
    pub fn insert_event(&self, event: &Event) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO events (id, source, event_type, created_at, data)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                event.id,
                event.source,
                event.event_type,
                event.created_at.to_rfc3339(),
                event.data.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Replace an event's payload and bump its timestamp (sleep merge path)
    pub fn update_event_data(
        &self,
        id: &str,
        data: &serde_json::Value,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE events SET data = ?1, created_at = ?2 WHERE id = ?3",
            params![data.to_string(), updated_at.to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(Error::InvalidInput(format!("no event with id {}", id)));
        }
        Ok(())
    }

    /// Get an event by ID
    pub fn get_event(&self, id: &str) -> Result<Option<Event>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT * FROM events WHERE id = ?", [id], Self::row_to_event)
            .optional()
            .map_err(Error::from)
    }

    /// Most recently updated event of a given type, if any
    pub fn latest_event(&self, event_type: &str) -> Result<Option<Event>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM events WHERE event_type = ? ORDER BY created_at DESC LIMIT 1",
            [event_type],
            Self::row_to_event,
        )
        .optional()
        .map_err(Error::from)
    }

    /// Newest events across all types (the stream feed)
    pub fn latest_events(&self, limit: usize) -> Result<Vec<Event>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM events ORDER BY created_at DESC LIMIT ?")?;
        let events = stmt
            .query_map(params![limit as i64], Self::row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// List events matching a filter
    pub fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let conn = self.conn.lock().unwrap();

        let mut sql = String::from("SELECT * FROM events WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![];

        if let Some(source) = &filter.source {
            sql.push_str(" AND source = ?");
            params.push(Box::new(source.clone()));
        }

        if let Some(event_type) = &filter.event_type {
            sql.push_str(" AND event_type = ?");
            params.push(Box::new(event_type.clone()));
        }

        if let Some(event_types) = &filter.event_types {
            let placeholders = vec!["?"; event_types.len()].join(", ");
            sql.push_str(&format!(" AND event_type IN ({})", placeholders));
            for event_type in event_types {
                params.push(Box::new(event_type.clone()));
            }
        }

        if let Some(since) = &filter.since {
            sql.push_str(" AND created_at >= ?");
            params.push(Box::new(since.to_rfc3339()));
        }

        if filter.ascending {
            sql.push_str(" ORDER BY created_at ASC");
        } else {
            sql.push_str(" ORDER BY created_at DESC");
        }

        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let params_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params_refs.as_slice(), Self::row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    /// Total event count
    pub fn count_events(&self) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
        let created_at_str: String = row.get("created_at")?;
        let data_str: String = row.get("data")?;

        Ok(Event {
            id: row.get("id")?,
            source: row.get("source")?,
            event_type: row.get("event_type")?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            data: serde_json::from_str(&data_str).unwrap_or_else(|_| serde_json::json!({})),
        })
    }
}
