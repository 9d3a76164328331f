use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{FactdeskError, Result};
use crate::fields::{parse_datetime, FieldKind, FieldValue};
use crate::models::{Agency, Timestamp, REPORTS};
use crate::settings::AgencyMatch;
use crate::store::{load_agencies, DocumentStore, Predicate};

// ---------------------------------------------------------------------------
// Agency matching
// ---------------------------------------------------------------------------

/// Resolves CSV agency names against the agencies of one state at a time.
struct AgencyMatcher<'a> {
    store: &'a dyn DocumentStore,
    mode: AgencyMatch,
    whitespace: Regex,
    by_state: HashMap<String, Vec<Agency>>,
}

impl<'a> AgencyMatcher<'a> {
    fn new(store: &'a dyn DocumentStore, mode: AgencyMatch) -> Result<Self> {
        let whitespace = Regex::new(r"\s+").map_err(|e| FactdeskError::Other(e.to_string()))?;
        Ok(Self {
            store,
            mode,
            whitespace,
            by_state: HashMap::new(),
        })
    }

    fn normalize(&self, name: &str) -> String {
        self.whitespace
            .replace_all(name.trim(), " ")
            .to_lowercase()
    }

    fn agencies(&mut self, state: &str) -> Result<&[Agency]> {
        if !self.by_state.contains_key(state) {
            let found = load_agencies(self.store, &[Predicate::eq("state", state)])?;
            self.by_state.insert(state.to_string(), found);
        }
        Ok(self.by_state.get(state).map(Vec::as_slice).unwrap_or_default())
    }

    /// The stored agency name that `name` refers to within `state`.
    fn resolve(&mut self, state: &str, name: &str) -> Result<Option<String>> {
        let wanted = self.normalize(name);
        let names: Vec<String> = self.agencies(state)?.iter().map(|a| a.name.clone()).collect();
        Ok(names.into_iter().find(|stored| {
            let normalized = self.normalize(stored);
            match self.mode {
                AgencyMatch::Exact => normalized == wanted,
                AgencyMatch::Contains => normalized.contains(&wanted),
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Row coercion
// ---------------------------------------------------------------------------

fn coerce(column: &str, raw: &str, now: DateTime<Utc>) -> Result<Value> {
    match column {
        "read" => Ok(Value::Bool(raw.trim().eq_ignore_ascii_case("true"))),
        "images" => Ok(FieldKind::Array.parse(column, raw)?.to_json()),
        "createdDate" if raw.trim().is_empty() => {
            Ok(serde_json::to_value(Timestamp::from_datetime(now))?)
        }
        "createdDate" => {
            let dt = parse_datetime(raw).ok_or_else(|| FactdeskError::InvalidField {
                field: column.to_string(),
                reason: format!("{raw:?} is not a date"),
            })?;
            Ok(FieldValue::Timestamp(dt).to_json())
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Build a report body from one CSV row. `parent.child` columns are folded
/// back into nested objects.
fn row_to_document(headers: &[String], record: &csv::StringRecord, now: DateTime<Utc>) -> Result<Map<String, Value>> {
    let mut doc = Map::new();
    for (column, raw) in headers.iter().zip(record.iter()) {
        if column == "userEmail" {
            continue;
        }
        let value = coerce(column, raw, now)?;
        match column.split_once('.') {
            Some((parent, child)) => {
                let entry = doc
                    .entry(parent.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(children) = entry {
                    children.insert(child.to_string(), value);
                }
            }
            None => {
                doc.insert(column.clone(), value);
            }
        }
    }
    if !doc.contains_key("createdDate") {
        doc.insert(
            "createdDate".into(),
            serde_json::to_value(Timestamp::from_datetime(now))?,
        );
    }
    Ok(doc)
}

// ---------------------------------------------------------------------------
// import
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub unmatched_agencies: usize,
}

/// Insert every CSV row as a report. Rows fail independently.
pub fn import_reports<R: Read>(
    store: &dyn DocumentStore,
    input: R,
    mode: AgencyMatch,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(String::is_empty) {
        return Err(FactdeskError::Other("CSV file has no header row".into()));
    }

    let mut matcher = AgencyMatcher::new(store, mode)?;
    let mut summary = ImportSummary::default();

    for (index, record) in rdr.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(line, error = %e, "unreadable CSV row");
                summary.failed += 1;
                continue;
            }
        };
        let mut doc = match row_to_document(&headers, &record, now) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping row");
                summary.failed += 1;
                continue;
            }
        };

        let state = doc.get("state").and_then(Value::as_str).map(str::to_string);
        let agency = doc.get("agency").and_then(Value::as_str).map(str::to_string);
        if let (Some(state), Some(agency)) = (state, agency) {
            if !agency.trim().is_empty() {
                let resolved = matcher.resolve(&state, &agency).unwrap_or_else(|e| {
                    tracing::warn!(line, error = %e, "agency lookup failed");
                    None
                });
                if resolved.is_none() {
                    tracing::warn!(line, agency = %agency, state = %state, "no matching agency");
                    summary.unmatched_agencies += 1;
                }
                doc.insert("agency".into(), Value::String(resolved.unwrap_or_default()));
            }
        }

        match store.create_document(REPORTS, Value::Object(doc)) {
            Ok(_) => summary.imported += 1,
            Err(e) => {
                tracing::warn!(line, error = %e, "failed to insert report");
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        failed = summary.failed,
        unmatched = summary.unmatched_agencies,
        "import finished"
    );
    Ok(summary)
}

pub fn import_file(
    store: &dyn DocumentStore,
    path: &Path,
    mode: AgencyMatch,
    now: DateTime<Utc>,
) -> Result<ImportSummary> {
    let file = std::fs::File::open(path)?;
    import_reports(store, file, mode, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use crate::exporter::export_reports;
    use crate::models::{Report, AGENCIES};
    use crate::store::load_reports;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn seed_agencies(store: &dyn DocumentStore) {
        store
            .create_document(AGENCIES, json!({"name": "Ohio Department of Health", "state": "OH", "city": "Columbus"}))
            .unwrap();
        store
            .create_document(AGENCIES, json!({"name": "Texas Department of Health", "state": "TX"}))
            .unwrap();
    }

    fn import(store: &dyn DocumentStore, text: &str, mode: AgencyMatch) -> ImportSummary {
        import_reports(store, text.as_bytes(), mode, now()).unwrap()
    }

    #[test]
    fn test_coerces_known_columns() {
        let (_dir, store) = test_store();
        let csv = "title,read,images,createdDate,userEmail\nFlood,true,\"a.png, b.png\",2024-01-02,x@y.z\n";
        let summary = import(&store, csv, AgencyMatch::Exact);
        assert_eq!(summary.imported, 1);

        let doc = &store.query_documents(REPORTS, &[]).unwrap()[0].data;
        assert_eq!(doc["read"], json!(true));
        assert_eq!(doc["images"], json!(["a.png", "b.png"]));
        assert_eq!(doc["createdDate"]["seconds"], json!(1_704_153_600));
        assert!(doc.get("userEmail").is_none());
        assert_eq!(doc["title"], json!("Flood"));
    }

    #[test]
    fn test_exact_match_normalizes_case_and_spaces() {
        let (_dir, store) = test_store();
        seed_agencies(&store);
        let csv = "agency,state\n  ohio   department of HEALTH ,OH\n";
        let summary = import(&store, csv, AgencyMatch::Exact);
        assert_eq!(summary.unmatched_agencies, 0);
        assert_eq!(load_reports(&store).unwrap()[0].agency, "Ohio Department of Health");
    }

    #[test]
    fn test_agency_match_is_scoped_to_state() {
        let (_dir, store) = test_store();
        seed_agencies(&store);
        let csv = "agency,state\nOhio Department of Health,TX\n";
        let summary = import(&store, csv, AgencyMatch::Exact);
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.unmatched_agencies, 1);
        assert_eq!(load_reports(&store).unwrap()[0].agency, "");
    }

    #[test]
    fn test_contains_mode_accepts_partial_names() {
        let (_dir, store) = test_store();
        seed_agencies(&store);
        let csv = "agency,state\ndepartment,TX\n";
        assert_eq!(import(&store, csv, AgencyMatch::Exact).unmatched_agencies, 1);
        assert_eq!(import(&store, csv, AgencyMatch::Contains).unmatched_agencies, 0);
        let agencies: Vec<String> = load_reports(&store).unwrap().into_iter().map(|r| r.agency).collect();
        assert!(agencies.contains(&"Texas Department of Health".to_string()));
    }

    #[test]
    fn test_bad_row_does_not_stop_import() {
        let (_dir, store) = test_store();
        let csv = "title,createdDate\nGood,2024-01-01\nBad,not a date\nAlso good,\n";
        let summary = import(&store, csv, AgencyMatch::Exact);
        assert_eq!(summary, ImportSummary { imported: 2, failed: 1, unmatched_agencies: 0 });
        let reports = load_reports(&store).unwrap();
        let fallback = reports.iter().find(|r| r.title == "Also good").unwrap();
        assert_eq!(fallback.created_date.to_datetime(), now());
    }

    #[test]
    fn test_dotted_columns_nest() {
        let (_dir, store) = test_store();
        import(&store, "meta.lang,meta.region\nen,midwest\n", AgencyMatch::Exact);
        let doc = &store.query_documents(REPORTS, &[]).unwrap()[0].data;
        assert_eq!(doc["meta"], json!({"lang": "en", "region": "midwest"}));
    }

    #[test]
    fn test_csv_round_trip() {
        let (_src_dir, source) = test_store();
        seed_agencies(&source);
        let originals = vec![
            Report {
                user_id: "u1".into(),
                email: "a@example.org".into(),
                agency: "Ohio Department of Health".into(),
                topic: "Health".into(),
                source: "Facebook".into(),
                title: "Miracle cure, \"guaranteed\"".into(),
                link: "https://example.org/post".into(),
                detail: "Line one\nline two".into(),
                images: vec!["file:///a.png".into(), "file:///b.png".into()],
                created_date: Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()),
                read: true,
                label: "false".into(),
                city: "Columbus".into(),
                state: "OH".into(),
                ..Report::default()
            },
            Report {
                user_id: "u2".into(),
                agency: "Texas Department of Health".into(),
                title: "Water rumor".into(),
                detail: "d".into(),
                created_date: Timestamp::from_datetime(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
                state: "TX".into(),
                ..Report::default()
            },
        ];
        for r in &originals {
            source
                .create_document(REPORTS, serde_json::to_value(r).unwrap())
                .unwrap();
        }

        let mut csv = Vec::new();
        export_reports(&source, &mut csv).unwrap();

        let (_dst_dir, target) = test_store();
        seed_agencies(&target);
        let summary = import_reports(&target, csv.as_slice(), AgencyMatch::Exact, now()).unwrap();
        assert_eq!(summary, ImportSummary { imported: 2, failed: 0, unmatched_agencies: 0 });

        let imported = load_reports(&target).unwrap();
        for (got, want) in imported.iter().zip(&originals) {
            let mut got = got.clone();
            got.id = String::new();
            assert_eq!(&got, want);
        }
    }
}
