//! Document-store port and the typed lookups built on it.

use serde_json::Value;

use crate::error::Result;
use crate::models::{Agency, NamedOption, Report, AGENCIES, REPORTS};

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// A field condition evaluated against a document body.
#[derive(Debug, Clone)]
pub enum Predicate {
    Eq(String, Value),
}

impl Predicate {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::Eq(field.to_string(), value.into())
    }

    pub fn matches(&self, data: &Value) -> bool {
        match self {
            Self::Eq(field, expected) => data.get(field) == Some(expected),
        }
    }
}

pub trait DocumentStore {
    /// Insert a document under a generated id and return the id.
    fn create_document(&self, collection: &str, data: Value) -> Result<String>;
    /// Insert or replace a document under a known id.
    fn set_document(&self, collection: &str, id: &str, data: Value) -> Result<()>;
    fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>>;
    fn query_documents(&self, collection: &str, predicates: &[Predicate]) -> Result<Vec<Document>>;
    /// Merge the top-level keys of `partial` into an existing document.
    fn update_document(&self, collection: &str, id: &str, partial: Value) -> Result<()>;
    fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}

/// All reports, newest first. Undecodable documents are skipped with a warning.
pub fn load_reports(store: &dyn DocumentStore) -> Result<Vec<Report>> {
    let mut reports: Vec<Report> = store
        .query_documents(REPORTS, &[])?
        .into_iter()
        .filter_map(|doc| match Report::from_document(&doc.id, doc.data) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(id = %doc.id, error = %e, "skipping malformed report");
                None
            }
        })
        .collect();
    reports.sort_by(|a, b| b.created_date.cmp(&a.created_date));
    Ok(reports)
}

pub fn load_agencies(store: &dyn DocumentStore, predicates: &[Predicate]) -> Result<Vec<Agency>> {
    let mut agencies: Vec<Agency> = store
        .query_documents(AGENCIES, predicates)?
        .into_iter()
        .filter_map(|doc| {
            let mut agency: Agency = serde_json::from_value(doc.data).ok()?;
            agency.id = doc.id;
            Some(agency)
        })
        .collect();
    agencies.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(agencies)
}

pub fn find_agency(store: &dyn DocumentStore, name: &str) -> Result<Option<Agency>> {
    Ok(load_agencies(store, &[Predicate::eq("name", name)])?
        .into_iter()
        .next())
}

/// Topics or sources, sorted by name.
pub fn load_options(store: &dyn DocumentStore, collection: &str) -> Result<Vec<NamedOption>> {
    let mut options: Vec<NamedOption> = store
        .query_documents(collection, &[])?
        .into_iter()
        .filter_map(|doc| {
            let mut option: NamedOption = serde_json::from_value(doc.data).ok()?;
            option.id = doc.id;
            Some(option)
        })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_predicate() {
        let data = json!({"state": "OH", "read": false});
        assert!(Predicate::eq("state", "OH").matches(&data));
        assert!(Predicate::eq("read", false).matches(&data));
        assert!(!Predicate::eq("state", "oh").matches(&data));
        assert!(!Predicate::eq("missing", "x").matches(&data));
    }
}
