use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};

use crate::error::FactdeskError;
use crate::models::Report;

/// Look-back window for the date filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportWeek {
    One,
    Two,
    Three,
    Four,
    #[default]
    All,
}

impl ReportWeek {
    pub const ALL_CHOICES: [ReportWeek; 5] = [Self::One, Self::Two, Self::Three, Self::Four, Self::All];

    pub fn weeks(self) -> Option<i64> {
        match self {
            Self::One => Some(1),
            Self::Two => Some(2),
            Self::Three => Some(3),
            Self::Four => Some(4),
            Self::All => None,
        }
    }

    /// Code used on the command line and in saved filters (`"100"` = all).
    pub fn code(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::All => "100",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::One => "last week",
            Self::Two => "last 2 weeks",
            Self::Three => "last 3 weeks",
            Self::Four => "last 4 weeks",
            Self::All => "all reports",
        }
    }

    /// The next wider window, wrapping back to one week.
    pub fn cycle(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::Three,
            Self::Three => Self::Four,
            Self::Four => Self::All,
            Self::All => Self::One,
        }
    }
}

impl FromStr for ReportWeek {
    type Err = FactdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            "3" => Ok(Self::Three),
            "4" => Ok(Self::Four),
            "100" | "all" => Ok(Self::All),
            other => Err(FactdeskError::InvalidField {
                field: "weeks".into(),
                reason: format!("expected 1, 2, 3, 4 or all, got {other:?}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFilter {
    #[default]
    All,
    Read,
    Unread,
}

impl ReadFilter {
    pub fn code(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Read => "true",
            Self::Unread => "false",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "read and unread",
            Self::Read => "read",
            Self::Unread => "unread",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            Self::All => Self::Unread,
            Self::Unread => Self::Read,
            Self::Read => Self::All,
        }
    }
}

impl FromStr for ReadFilter {
    type Err = FactdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "true" | "read" => Ok(Self::Read),
            "false" | "unread" => Ok(Self::Unread),
            other => Err(FactdeskError::InvalidField {
                field: "read".into(),
                reason: format!("expected all, true or false, got {other:?}"),
            }),
        }
    }
}

pub fn passes_week(report: &Report, week: ReportWeek, now: DateTime<Utc>) -> bool {
    match week.weeks() {
        Some(weeks) => report.created_date.to_datetime() >= now - Duration::days(weeks * 7),
        None => true,
    }
}

pub fn passes_read(report: &Report, filter: ReadFilter) -> bool {
    match filter {
        ReadFilter::All => true,
        ReadFilter::Read => report.read,
        ReadFilter::Unread => !report.read,
    }
}

/// Lower-cased text the search box matches against.
pub fn search_text(report: &Report) -> String {
    [
        &report.title,
        &report.detail,
        &report.city,
        &report.state,
        &report.label,
        &report.topic,
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .map(|s| s.to_lowercase())
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn passes_search(report: &Report, query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || search_text(report).contains(&query.to_lowercase())
}

/// Run the three stages in order (date, read status, search), each over the
/// previous stage's output. Returns indices into `reports`.
pub fn apply(
    reports: &[Report],
    week: ReportWeek,
    read: ReadFilter,
    search: &str,
    now: DateTime<Utc>,
) -> Vec<usize> {
    let by_date: Vec<usize> = (0..reports.len())
        .filter(|&i| passes_week(&reports[i], week, now))
        .collect();
    let by_read: Vec<usize> = by_date
        .into_iter()
        .filter(|&i| passes_read(&reports[i], read))
        .collect();
    by_read
        .into_iter()
        .filter(|&i| passes_search(&reports[i], search))
        .collect()
}
