use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::error::{ReportError, Result};
use crate::filter::Filterable;
use crate::models::{Collection, Record, User};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_created
    ON documents (collection, created_at DESC);

CREATE TABLE IF NOT EXISTS credentials (
    uid TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    locked_until TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS session (
    slot INTEGER PRIMARY KEY CHECK (slot = 1),
    uid TEXT NOT NULL,
    signed_in_at TEXT NOT NULL
);
";

const ID_LEN: usize = 20;

/// A stored JSON document and its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn month(&self) -> Option<&str> {
        self.data
            .get("month")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
    }

    /// Decode into a typed record, carrying the document id along.
    pub fn decode<T: Record>(&self) -> serde_json::Result<T> {
        let mut record: T = serde_json::from_value(self.data.clone())?;
        record.meta_mut().id = self.id.clone();
        Ok(record)
    }
}

impl Filterable for Document {
    fn month_key(&self) -> Option<&str> {
        self.month()
    }

    fn platform_key(&self) -> Option<&str> {
        self.data.get("platform").and_then(Value::as_str)
    }
}

/// The persistence contract every view and aggregation works against.
///
/// Queries return documents newest first by `createdAt`.
pub trait DocumentStore {
    fn insert(&self, collection: Collection, data: Value) -> Result<String>;
    /// Create or replace the document with a known id.
    fn set(&self, collection: Collection, id: &str, data: Value) -> Result<()>;
    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;
    /// Merge the top-level fields of `patch` into the stored document.
    fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<()>;
    fn delete(&self, collection: Collection, id: &str) -> Result<()>;
    fn query_all(&self, collection: Collection) -> Result<Vec<Document>>;
    fn query_eq(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Document>>;
}

pub struct SqliteStore {
    conn: Connection,
}

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn new_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn as_object(data: Value) -> Result<Map<String, Value>> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(ReportError::Other(format!(
            "documents must be JSON objects, got {other}"
        ))),
    }
}

/// Normalize `createdAt` in the body and return the sortable column value.
fn stamp_created(map: &mut Map<String, Value>) -> String {
    let parsed = map
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc));
    let created = timestamp(parsed.unwrap_or_else(Utc::now));
    map.insert("createdAt".to_string(), Value::String(created.clone()));
    created
}

fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::Null => Sql::Null,
        Value::Bool(b) => Sql::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Sql::Integer(i),
            None => Sql::Real(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Sql::Text(s.clone()),
        other => Sql::Text(other.to_string()),
    }
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(get_connection(db_path)?))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn read_rows(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<Document>> {
        let mut stmt = self.conn.prepare(sql)?;
        let raw: Vec<(String, String)> = stmt
            .query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(id, data)| {
                Ok(Document {
                    id,
                    data: serde_json::from_str(&data)?,
                })
            })
            .collect()
    }
}

impl DocumentStore for SqliteStore {
    fn insert(&self, collection: Collection, data: Value) -> Result<String> {
        let id = new_id();
        self.set(collection, &id, data)?;
        Ok(id)
    }

    fn set(&self, collection: Collection, id: &str, data: Value) -> Result<()> {
        let mut map = as_object(data)?;
        map.remove("id");
        let created = stamp_created(&mut map);
        self.conn.execute(
            "INSERT INTO documents (collection, id, data, created_at) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, created_at = excluded.created_at",
            rusqlite::params![collection.name(), id, Value::Object(map).to_string(), created],
        )?;
        tracing::debug!(collection = collection.name(), id, "document written");
        Ok(())
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                [collection.name(), id],
                |row| row.get(0),
            )
            .optional()?;
        match data {
            Some(d) => Ok(Some(Document {
                id: id.to_string(),
                data: serde_json::from_str(&d)?,
            })),
            None => Ok(None),
        }
    }

    fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<()> {
        let existing = self.get(collection, id)?.ok_or_else(|| ReportError::NotFound {
            collection: collection.name().to_string(),
            id: id.to_string(),
        })?;
        let mut map = as_object(existing.data)?;
        for (key, value) in as_object(patch)? {
            if key != "id" && key != "createdAt" {
                map.insert(key, value);
            }
        }
        self.conn.execute(
            "UPDATE documents SET data = ?3 WHERE collection = ?1 AND id = ?2",
            rusqlite::params![collection.name(), id, Value::Object(map).to_string()],
        )?;
        tracing::debug!(collection = collection.name(), id, "document updated");
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let n = self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            [collection.name(), id],
        )?;
        if n == 0 {
            return Err(ReportError::NotFound {
                collection: collection.name().to_string(),
                id: id.to_string(),
            });
        }
        tracing::debug!(collection = collection.name(), id, "document deleted");
        Ok(())
    }

    fn query_all(&self, collection: Collection) -> Result<Vec<Document>> {
        self.read_rows(
            "SELECT id, data FROM documents WHERE collection = ?1 \
             ORDER BY created_at DESC, rowid DESC",
            &[&collection.name()],
        )
    }

    fn query_eq(&self, collection: Collection, field: &str, value: &Value) -> Result<Vec<Document>> {
        let path = format!("$.{field}");
        if value.is_null() {
            return self.read_rows(
                "SELECT id, data FROM documents WHERE collection = ?1 \
                 AND json_extract(data, ?2) IS NULL ORDER BY created_at DESC, rowid DESC",
                &[&collection.name(), &path],
            );
        }
        self.read_rows(
            "SELECT id, data FROM documents WHERE collection = ?1 \
             AND json_extract(data, ?2) = ?3 ORDER BY created_at DESC, rowid DESC",
            &[&collection.name(), &path, &to_sql_value(value)],
        )
    }
}

/// Decode documents, skipping (and logging) any that do not fit the record shape.
pub fn decode_documents<T: Record>(docs: &[Document]) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    collection = T::KIND.collection().name(),
                    id = %doc.id,
                    error = %e,
                    "skipping undecodable document"
                );
                None
            }
        })
        .collect()
}

/// Every record of one category, newest first.
pub fn fetch_records<T: Record>(store: &dyn DocumentStore) -> Result<Vec<T>> {
    let docs = store.query_all(T::KIND.collection())?;
    Ok(decode_documents(&docs))
}

/// Records submitted by one user.
pub fn fetch_owned<T: Record>(store: &dyn DocumentStore, user_id: &str) -> Result<Vec<T>> {
    let docs = store.query_eq(
        T::KIND.collection(),
        "userId",
        &Value::String(user_id.to_string()),
    )?;
    Ok(decode_documents(&docs))
}

pub fn fetch_record<T: Record>(store: &dyn DocumentStore, id: &str) -> Result<T> {
    let collection = T::KIND.collection();
    let doc = store.get(collection, id)?.ok_or_else(|| ReportError::NotFound {
        collection: collection.name().to_string(),
        id: id.to_string(),
    })?;
    Ok(doc.decode()?)
}

pub fn insert_record<T: Record>(store: &dyn DocumentStore, record: &T) -> Result<String> {
    store.insert(T::KIND.collection(), serde_json::to_value(record)?)
}

pub fn get_user(store: &dyn DocumentStore, uid: &str) -> Result<Option<User>> {
    match store.get(Collection::Users, uid)? {
        Some(doc) => Ok(Some(serde_json::from_value(doc.data)?)),
        None => Ok(None),
    }
}

pub fn put_user(store: &dyn DocumentStore, user: &User) -> Result<()> {
    store.set(Collection::Users, &user.uid, serde_json::to_value(user)?)
}
