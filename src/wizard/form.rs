use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::step::Step;
use crate::error::FactdeskError;

/// Choice that switches topic/source to free text.
pub const OTHER: &str = "Other";

/// Validation messages keyed by field name (`agency`, `topic`, ...).
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormData {
    pub selected_agency: String,
    pub selected_topic: String,
    pub selected_source: String,
    pub other_topic: String,
    pub other_source: String,
    pub title: String,
    pub link: String,
    pub second_link: String,
    pub detail: String,
    pub show_other_topic: bool,
    pub show_other_source: bool,
    #[serde(rename = "imageURLs")]
    pub image_urls: Vec<String>,
}

impl FormData {
    /// True until the user has touched any of the core fields. Links and
    /// images alone do not count.
    pub fn is_blank(&self) -> bool {
        [
            &self.title,
            &self.detail,
            &self.selected_agency,
            &self.selected_topic,
            &self.selected_source,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }

    pub fn select_topic(&mut self, name: &str) {
        self.selected_topic = name.trim().to_string();
        self.show_other_topic = self.selected_topic == OTHER;
        if !self.show_other_topic {
            self.other_topic.clear();
        }
    }

    pub fn select_source(&mut self, name: &str) {
        self.selected_source = name.trim().to_string();
        self.show_other_source = self.selected_source == OTHER;
        if !self.show_other_source {
            self.other_source.clear();
        }
    }

    /// The topic that ends up on the report.
    pub fn effective_topic(&self) -> &str {
        if self.show_other_topic {
            self.other_topic.trim()
        } else {
            self.selected_topic.trim()
        }
    }

    pub fn effective_source(&self) -> &str {
        if self.show_other_source {
            self.other_source.trim()
        } else {
            self.selected_source.trim()
        }
    }
}

/// Text fields the user can set directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Agency,
    Topic,
    OtherTopic,
    Source,
    OtherSource,
    Title,
    Link,
    SecondLink,
    Detail,
}

impl FormField {
    pub fn key(self) -> &'static str {
        match self {
            Self::Agency => "agency",
            Self::Topic => "topic",
            Self::OtherTopic => "otherTopic",
            Self::Source => "source",
            Self::OtherSource => "otherSource",
            Self::Title => "title",
            Self::Link => "link",
            Self::SecondLink => "secondLink",
            Self::Detail => "detail",
        }
    }

    /// Key under which this field's validation error is reported.
    pub fn error_key(self) -> &'static str {
        match self {
            Self::OtherTopic => "topic",
            Self::OtherSource => "source",
            other => other.key(),
        }
    }
}

impl FromStr for FormField {
    type Err = FactdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "agency" => Self::Agency,
            "topic" => Self::Topic,
            "otherTopic" | "other-topic" => Self::OtherTopic,
            "source" => Self::Source,
            "otherSource" | "other-source" => Self::OtherSource,
            "title" => Self::Title,
            "link" => Self::Link,
            "secondLink" | "second-link" => Self::SecondLink,
            "detail" => Self::Detail,
            _ => {
                return Err(FactdeskError::InvalidField {
                    field: s.to_string(),
                    reason: "unknown report field".into(),
                })
            }
        };
        Ok(field)
    }
}

fn require(errors: &mut FieldErrors, key: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(key.to_string(), message.to_string());
    }
}

fn check_agency(form: &FormData, errors: &mut FieldErrors) {
    require(errors, "agency", &form.selected_agency, "Agency is required");
}

fn check_topic(form: &FormData, errors: &mut FieldErrors) {
    require(errors, "topic", &form.selected_topic, "Topic is required");
    if form.show_other_topic && !errors.contains_key("topic") {
        require(errors, "topic", &form.other_topic, "Please describe the topic");
    }
}

fn check_source(form: &FormData, errors: &mut FieldErrors) {
    require(errors, "source", &form.selected_source, "Source is required");
    if form.show_other_source && !errors.contains_key("source") {
        require(errors, "source", &form.other_source, "Please describe the source");
    }
}

fn check_details(form: &FormData, errors: &mut FieldErrors) {
    require(errors, "title", &form.title, "Title is required");
    require(errors, "detail", &form.detail, "Detail is required");
}

/// Rules that gate leaving `step`. Details and review check everything.
pub fn validate_step(step: Step, form: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();
    match step {
        Step::Agency => check_agency(form, &mut errors),
        Step::Topic => check_topic(form, &mut errors),
        Step::Source => check_source(form, &mut errors),
        Step::Details | Step::Review => return validate_all(form),
        Step::Reminder | Step::Intro | Step::View => {}
    }
    errors
}

pub fn validate_all(form: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();
    check_agency(form, &mut errors);
    check_topic(form, &mut errors);
    check_source(form, &mut errors);
    check_details(form, &mut errors);
    errors
}

/// Error keys a step is responsible for, cleared once the step validates.
pub fn step_error_keys(step: Step) -> &'static [&'static str] {
    match step {
        Step::Agency => &["agency"],
        Step::Topic => &["topic"],
        Step::Source => &["source"],
        Step::Details | Step::Review => &["agency", "topic", "source", "title", "detail"],
        Step::Reminder | Step::Intro | Step::View => &[],
    }
}
