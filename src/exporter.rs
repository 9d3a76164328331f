use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::fields::FieldValue;
use crate::models::{UserProfile, REPORTS, USERS};
use crate::store::DocumentStore;

const CREATED_DATE: &str = "createdDate";
const USER_ID: &str = "userID";
const USER_EMAIL: &str = "userEmail";
const IMAGES: &str = "images";

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// One report as ordered `(column, value)` pairs. Plain objects are spread
/// one level deep as `parent.child`; timestamps and geopoints stay whole.
fn flatten(data: &Value) -> Vec<(String, FieldValue)> {
    let mut cells = Vec::new();
    let Value::Object(map) = data else {
        return cells;
    };
    for (key, value) in map {
        match FieldValue::from_json(value) {
            FieldValue::Object(children) => {
                for (child, v) in &children {
                    cells.push((format!("{key}.{child}"), FieldValue::from_json(v)));
                }
            }
            other => cells.push((key.clone(), other)),
        }
    }
    cells
}

/// Union of columns in first-seen order, with `createdDate` guaranteed,
/// `userEmail` right after `userID` and `images` last.
fn columns(rows: &[Vec<(String, FieldValue)>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for (key, _) in row {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }
    if !seen.contains(CREATED_DATE) {
        columns.push(CREATED_DATE.to_string());
    }
    let had_images = seen.contains(IMAGES);
    columns.retain(|c| c != IMAGES);
    match columns.iter().position(|c| c == USER_ID) {
        Some(i) => columns.insert(i + 1, USER_EMAIL.to_string()),
        None => columns.insert(0, USER_EMAIL.to_string()),
    }
    if had_images {
        columns.push(IMAGES.to_string());
    }
    columns
}

fn created_at(row: &[(String, FieldValue)]) -> Option<DateTime<Utc>> {
    row.iter().find_map(|(k, v)| match (k.as_str(), v) {
        (CREATED_DATE, FieldValue::Timestamp(dt)) => Some(*dt),
        _ => None,
    })
}

fn cell<'a>(row: &'a [(String, FieldValue)], column: &str) -> Option<&'a FieldValue> {
    row.iter().find(|(k, _)| k == column).map(|(_, v)| v)
}

// ---------------------------------------------------------------------------
// User email lookup
// ---------------------------------------------------------------------------

struct EmailLookup<'a> {
    store: &'a dyn DocumentStore,
    cache: HashMap<String, Option<String>>,
}

impl<'a> EmailLookup<'a> {
    fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// The `users` profile email, if that user has one on file.
    fn email_for(&mut self, user_id: &str) -> Option<String> {
        if user_id.is_empty() {
            return None;
        }
        let store = self.store;
        self.cache
            .entry(user_id.to_string())
            .or_insert_with(|| match store.get_document(USERS, user_id) {
                Ok(Some(data)) => serde_json::from_value::<UserProfile>(data)
                    .ok()
                    .map(|p| p.email)
                    .filter(|e| !e.is_empty()),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "user lookup failed");
                    None
                }
            })
            .clone()
    }
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

/// Write every report as CSV, newest first. Returns the number of rows.
pub fn export_reports<W: Write>(store: &dyn DocumentStore, out: W) -> Result<usize> {
    let mut rows: Vec<Vec<(String, FieldValue)>> = store
        .query_documents(REPORTS, &[])?
        .iter()
        .map(|doc| flatten(&doc.data))
        .collect();
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));

    let columns = columns(&rows);
    let mut emails = EmailLookup::new(store);
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(&columns)?;

    for row in &rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| match column.as_str() {
                USER_EMAIL => {
                    let user_id = cell(row, USER_ID).map(FieldValue::display).unwrap_or_default();
                    emails
                        .email_for(&user_id)
                        .or_else(|| cell(row, "email").map(FieldValue::display))
                        .unwrap_or_default()
                }
                _ => cell(row, column).map(FieldValue::display).unwrap_or_default(),
            })
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    tracing::info!(rows = rows.len(), columns = columns.len(), "exported reports");
    Ok(rows.len())
}

pub fn default_export_path(data_dir: &Path, now: DateTime<Utc>) -> PathBuf {
    data_dir
        .join("exports")
        .join(format!("reports-{}.csv", now.format("%Y-%m-%d")))
}

/// Export to a file, creating parent directories.
pub fn export_to_path(store: &dyn DocumentStore, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    export_reports(store, file)
}
