//! Project database introspection tools.
//!
//! Wraps a read-only SQLite connection that is opened on first use and
//! cached for the process lifetime. The server loop is single-threaded, so
//! a plain `OnceCell` is enough; no locking is involved.

use std::cell::OnceCell;
use std::path::PathBuf;
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use regex::Regex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// Statement keywords accepted by `query_database`.
///
/// The connection is read-only at the SQLite level as well; this check just
/// rejects write attempts with a clearer message before they reach SQLite.
const READ_KEYWORDS: [&str; 4] = ["SELECT", "WITH", "EXPLAIN", "PRAGMA"];

fn identifier_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"))
}

/// Lazily opened, read-only handle to the project database.
pub struct Database {
    /// Path to the SQLite file.
    path: PathBuf,
    /// Hard cap on rows returned by a single query.
    max_rows: usize,
    /// Connection cache, populated on first use.
    conn: OnceCell<Connection>,
}

impl Database {
    /// Creates a handle without touching the filesystem.
    ///
    /// The connection is deferred until the first tool call that needs it,
    /// keeping process startup fast.
    #[must_use]
    pub const fn new(path: PathBuf, max_rows: usize) -> Self {
        Self {
            path,
            max_rows,
            conn: OnceCell::new(),
        }
    }

    /// Returns the cached connection, opening it on first use.
    fn connection(&self) -> Result<&Connection, ToolError> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn);
        }

        if !self.path.exists() {
            return Err(ToolError::DatabaseNotFound {
                path: self.path.clone(),
            });
        }

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::debug!(path = %self.path.display(), "opened project database");

        Ok(self.conn.get_or_init(|| conn))
    }

    /// Lists user tables and views with their row counts.
    ///
    /// # Errors
    ///
    /// Returns a tool failure if the database is missing or unreadable.
    pub fn list_tables(&self) -> Result<Value, ToolError> {
        let conn = self.connection()?;

        let mut stmt = conn.prepare(
            "SELECT name, type FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = Vec::with_capacity(entries.len());
        for (name, kind) in entries {
            // A view over a missing table fails to count; report null instead
            // of failing the whole listing.
            let count_sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&name));
            let row_count = conn
                .query_row(&count_sql, [], |row| row.get::<_, i64>(0))
                .map_or(Value::Null, Value::from);

            tables.push(json!({
                "name": name,
                "type": kind,
                "row_count": row_count,
            }));
        }

        Ok(json!({"tables": tables}))
    }

    /// Describes one table: columns, indexes, foreign keys.
    ///
    /// # Errors
    ///
    /// Returns a tool failure if the name is not a plain identifier or the
    /// table does not exist.
    pub fn describe_table(&self, name: &str) -> Result<Value, ToolError> {
        if !identifier_pattern().is_match(name) {
            return Err(ToolError::InvalidTableName {
                name: name.to_string(),
            });
        }

        let conn = self.connection()?;

        let exists = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type IN ('table', 'view') AND name = ?1",
            [name],
            |row| row.get::<_, i64>(0),
        )?;
        if exists == 0 {
            return Err(ToolError::TableNotFound {
                name: name.to_string(),
            });
        }

        let quoted = quote_identifier(name);

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({quoted})"))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(json!({
                    "name": row.get::<_, String>(1)?,
                    "type": row.get::<_, String>(2)?,
                    "not_null": row.get::<_, bool>(3)?,
                    "default": row.get::<_, Option<String>>(4)?,
                    "primary_key": row.get::<_, i64>(5)? > 0,
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!("PRAGMA index_list({quoted})"))?;
        let index_names = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, bool>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut indexes = Vec::with_capacity(index_names.len());
        for (index_name, unique) in index_names {
            let mut stmt =
                conn.prepare(&format!("PRAGMA index_info({})", quote_identifier(&index_name)))?;
            let index_columns = stmt
                .query_map([], |row| row.get::<_, Option<String>>(2))?
                .collect::<Result<Vec<_>, _>>()?;

            indexes.push(json!({
                "name": index_name,
                "unique": unique,
                "columns": index_columns,
            }));
        }

        let mut stmt = conn.prepare(&format!("PRAGMA foreign_key_list({quoted})"))?;
        let foreign_keys = stmt
            .query_map([], |row| {
                Ok(json!({
                    "table": row.get::<_, String>(2)?,
                    "from": row.get::<_, String>(3)?,
                    "to": row.get::<_, Option<String>>(4)?,
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(json!({
            "table": name,
            "columns": columns,
            "indexes": indexes,
            "foreign_keys": foreign_keys,
        }))
    }

    /// Runs one read-only SQL statement and returns the rows as objects.
    ///
    /// # Errors
    ///
    /// Returns a tool failure for non-read statements, SQL errors, or a
    /// missing database.
    pub fn query(&self, sql: &str, max_rows: Option<usize>) -> Result<Value, ToolError> {
        let keyword = sql
            .trim_start()
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_uppercase();
        if !READ_KEYWORDS.contains(&keyword.as_str()) {
            return Err(ToolError::QueryRejected {
                reason: format!(
                    "only {} statements are accepted, got '{keyword}'",
                    READ_KEYWORDS.join("/")
                ),
            });
        }

        let limit = max_rows.map_or(self.max_rows, |n| n.clamp(1, self.max_rows));

        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let column_names: Vec<String> =
            stmt.column_names().iter().map(ToString::to_string).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        let mut truncated = false;
        while let Some(row) = rows.next()? {
            if out.len() >= limit {
                truncated = true;
                break;
            }

            let mut object = Map::with_capacity(column_names.len());
            for (i, column) in column_names.iter().enumerate() {
                object.insert(column.clone(), column_value(row.get_ref(i)?));
            }
            out.push(Value::Object(object));
        }

        Ok(json!({
            "columns": column_names,
            "row_count": out.len(),
            "rows": out,
            "truncated": truncated,
        }))
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("max_rows", &self.max_rows)
            .field("connected", &self.conn.get().is_some())
            .finish()
    }
}

/// Quotes an identifier for interpolation into SQL text.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Converts a SQLite column value to JSON.
///
/// BLOBs become `{"base64": "..."}` so binary data survives the text
/// protocol.
fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => json!({"base64": BASE64_STANDARD.encode(blob)}),
    }
}
