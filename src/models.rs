use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const REPORTS: &str = "reports";
pub const AGENCIES: &str = "agency";
pub const TOPICS: &str = "topics";
pub const SOURCES: &str = "sources";
pub const USERS: &str = "users";

/// Document-store timestamp, stored as `{seconds, nanoseconds}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanoseconds: u32,
}

impl Timestamp {
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }

    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.seconds, self.nanoseconds)
            .single()
            .unwrap_or_default()
    }

    pub fn to_rfc3339(self) -> String {
        self.to_datetime()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    }
}

/// A submitted report as stored in the `reports` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Report {
    /// Document id; not part of the stored body.
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    pub email: String,
    pub agency: String,
    pub topic: String,
    pub source: String,
    pub title: String,
    pub link: String,
    pub second_link: String,
    pub detail: String,
    pub images: Vec<String>,
    pub created_date: Timestamp,
    pub read: bool,
    pub label: String,
    pub note: String,
    pub city: String,
    pub state: String,
}

impl Report {
    /// Decode a stored document body, attaching its id.
    pub fn from_document(id: &str, data: serde_json::Value) -> serde_json::Result<Self> {
        let mut report: Report = serde_json::from_value(data)?;
        report.id = id.to_string();
        Ok(report)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Agency {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub state: String,
    pub city: String,
}

/// A topic or source choice offered by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedOption {
    #[serde(skip)]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_serializes_store_field_names() {
        let report = Report {
            id: "r1".into(),
            user_id: "u1".into(),
            second_link: "https://b".into(),
            created_date: Timestamp { seconds: 10, nanoseconds: 5 },
            ..Report::default()
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["userID"], "u1");
        assert_eq!(value["secondLink"], "https://b");
        assert_eq!(value["createdDate"], json!({"seconds": 10, "nanoseconds": 5}));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_report_from_sparse_document() {
        let report = Report::from_document("abc", json!({"title": "Fake cure", "read": true})).unwrap();
        assert_eq!(report.id, "abc");
        assert_eq!(report.title, "Fake cure");
        assert!(report.read);
        assert!(report.images.is_empty());
    }

    #[test]
    fn test_timestamp_roundtrip_through_datetime() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        let ts = Timestamp::from_datetime(dt);
        assert_eq!(ts.to_datetime(), dt);
        assert_eq!(ts.to_rfc3339(), "2024-01-01T12:30:00.000Z");
    }
}
