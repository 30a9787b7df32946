//! SQLite trace store.
//!
//! Opens the message database read-only and answers event, interaction and
//! timespan queries for stored systems and bounded views over them.

use std::path::{Path, PathBuf};

use ned_common::{Error, Result, SystemId, SystemView};
use ned_config::InteractionSelector;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags, OptionalExtension};
use tracing::debug;

use super::{StoredSystem, TraceSource};

/// Read-only SQLite trace store.
///
/// Expected tables:
/// `systems(id, description)`, `messages(message_id, system_id, timestamp)`,
/// `sources(message_id, device_id)`,
/// `devices(device_id, system_id, description, send_only)`,
/// `presence(message_id)`.
pub struct SqliteTraceSource {
    conn: Connection,
    path: PathBuf,
}

fn source_error(path: &Path, err: rusqlite::Error) -> Error {
    Error::Source(format!("{}: {}", path.display(), err))
}

/// Bind numeric ids as integers so they compare equal to INTEGER columns.
fn id_value(id: &SystemId) -> Value {
    match id.as_str().parse::<i64>() {
        Ok(n) => Value::Integer(n),
        Err(_) => Value::Text(id.as_str().to_string()),
    }
}

fn value_to_id(value: Value) -> SystemId {
    match value {
        Value::Integer(n) => SystemId::from(n),
        Value::Real(f) => SystemId::new(f.to_string()),
        Value::Text(s) => SystemId::new(s),
        Value::Null | Value::Blob(_) => SystemId::new("?"),
    }
}

/// Append `timestamp` bound clauses for a bounded view.
fn push_bounds(view: &SystemView, sql: &mut String, params: &mut Vec<Value>) {
    let (from, to) = view.bounds();
    if let Some(from) = from {
        sql.push_str(" AND messages.timestamp >= ?");
        params.push(Value::Real(from));
    }
    if let Some(to) = to {
        sql.push_str(" AND messages.timestamp <= ?");
        params.push(Value::Real(to));
    }
}

impl SqliteTraceSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| source_error(&path, e))?;
        debug!(path = %path.display(), "opened trace store");
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_system(&self, id: &SystemId) -> Result<()> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM systems WHERE id = ?1 LIMIT 1",
                [id_value(id)],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| source_error(&self.path, e))?;
        match found {
            Some(_) => Ok(()),
            None => Err(Error::SystemNotFound {
                system: id.to_string(),
            }),
        }
    }

    fn timestamps(&self, sql: &str, params: Vec<Value>) -> Result<Vec<f64>> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| source_error(&self.path, e))?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| row.get::<_, f64>(0))
            .map_err(|e| source_error(&self.path, e))?;
        rows.collect::<rusqlite::Result<Vec<f64>>>()
            .map_err(|e| source_error(&self.path, e))
    }

    fn edge(&self, view: &SystemView, order: &str) -> Result<Option<f64>> {
        let mut sql = String::from("SELECT messages.timestamp FROM messages WHERE messages.system_id = ?");
        let mut params = vec![id_value(view.base())];
        push_bounds(view, &mut sql, &mut params);
        sql.push_str(&format!(" ORDER BY messages.timestamp {} LIMIT 1", order));
        Ok(self.timestamps(&sql, params)?.into_iter().next())
    }
}

impl TraceSource for SqliteTraceSource {
    fn genuine_events(&self, view: &SystemView) -> Result<Vec<f64>> {
        self.ensure_system(view.base())?;
        let mut sql = String::from("SELECT messages.timestamp FROM messages WHERE messages.system_id = ?");
        let mut params = vec![id_value(view.base())];
        push_bounds(view, &mut sql, &mut params);
        sql.push_str(" ORDER BY messages.timestamp ASC");
        self.timestamps(&sql, params)
    }

    fn interaction_events(
        &self,
        view: &SystemView,
        selector: &InteractionSelector,
    ) -> Result<Vec<f64>> {
        if selector.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_system(view.base())?;

        let mut sql = String::from(
            "SELECT DISTINCT messages.timestamp FROM messages \
             INNER JOIN sources ON messages.message_id = sources.message_id \
             INNER JOIN devices ON sources.device_id = devices.device_id \
             INNER JOIN presence ON messages.message_id = presence.message_id \
             WHERE messages.system_id = ?",
        );
        let mut params = vec![id_value(view.base())];
        if !selector.all_devices {
            let clauses = vec!["devices.description GLOB ?"; selector.device_globs.len()];
            sql.push_str(&format!(" AND ({})", clauses.join(" OR ")));
            params.extend(selector.device_globs.iter().cloned().map(Value::Text));
        }
        push_bounds(view, &mut sql, &mut params);
        sql.push_str(" ORDER BY messages.timestamp ASC");
        self.timestamps(&sql, params)
    }

    fn timespan(&self, view: &SystemView) -> Result<(f64, f64)> {
        self.ensure_system(view.base())?;
        match (self.edge(view, "ASC")?, self.edge(view, "DESC")?) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(Error::EmptyTrace {
                system: view.id().to_string(),
                reason: "no messages inside the view's bounds".to_string(),
            }),
        }
    }

    fn systems(&self) -> Result<Vec<StoredSystem>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT systems.id, systems.description, \
                 (SELECT COUNT(*) FROM messages WHERE messages.system_id = systems.id) \
                 FROM systems ORDER BY systems.id",
            )
            .map_err(|e| source_error(&self.path, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredSystem {
                    id: value_to_id(row.get::<_, Value>(0)?),
                    description: row.get::<_, Option<String>>(1)?,
                    messages: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })
            .map_err(|e| source_error(&self.path, e))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| source_error(&self.path, e))
    }
}
