use std::path::Path;

use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{FactdeskError, Result};
use crate::store::{Document, DocumentStore, Predicate};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS documents_by_collection ON documents (collection);
";

const ID_LEN: usize = 20;

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

/// JSON documents in a single SQLite table, keyed by (collection, id).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }
}

fn decode(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

impl DocumentStore for SqliteStore {
    fn create_document(&self, collection: &str, data: Value) -> Result<String> {
        let id = generate_id();
        self.conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3)",
            rusqlite::params![collection, id, data.to_string()],
        )?;
        tracing::debug!(collection, id = %id, "created document");
        Ok(id)
    }

    fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<()> {
        self.conn.execute(
            "INSERT INTO documents (collection, id, data) VALUES (?1, ?2, ?3) \
             ON CONFLICT (collection, id) DO UPDATE SET data = excluded.data, updated_at = datetime('now')",
            rusqlite::params![collection, id, data.to_string()],
        )?;
        Ok(())
    }

    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                rusqlite::params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        raw.as_deref().map(decode).transpose()
    }

    fn query_documents(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT id, data FROM documents WHERE collection = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map([collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut docs = Vec::with_capacity(rows.len());
        for (id, raw) in rows {
            let data = decode(&raw)?;
            if predicates.iter().all(|p| p.matches(&data)) {
                docs.push(Document { id, data });
            }
        }
        Ok(docs)
    }

    fn update_document(&self, collection: &str, id: &str, partial: Value) -> Result<()> {
        let mut data = self
            .get_document(collection, id)?
            .ok_or_else(|| FactdeskError::NotFound(format!("{collection}/{id}")))?;
        match (data.as_object_mut(), partial) {
            (Some(target), Value::Object(fields)) => {
                for (key, value) in fields {
                    target.insert(key, value);
                }
            }
            _ => {
                return Err(FactdeskError::Other(format!(
                    "update of {collection}/{id} requires an object"
                )))
            }
        }
        self.conn.execute(
            "UPDATE documents SET data = ?1, updated_at = datetime('now') WHERE collection = ?2 AND id = ?3",
            rusqlite::params![data.to_string(), collection, id],
        )?;
        Ok(())
    }

    fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            rusqlite::params![collection, id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
    (dir, store)
}
