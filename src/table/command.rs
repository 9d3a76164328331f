//! Optimistic report mutations.
//!
//! A command changes the in-memory table first, then writes the change
//! through the document store. When the write fails the command restores the
//! value it replaced, so the table never shows a state the store rejected.

use serde_json::{json, Value};

use super::ReportTable;
use crate::error::{FactdeskError, Result};
use crate::models::{Report, REPORTS};
use crate::store::DocumentStore;

pub trait ReportCommand {
    fn report_id(&self) -> &str;
    fn describe(&self) -> String;
    /// Change the local copy, remembering what was there.
    fn apply(&mut self, report: &mut Report) -> Result<()>;
    /// The partial document written to the store.
    fn patch(&self) -> Value;
    /// Put back what `apply` replaced.
    fn compensate(&self, report: &mut Report);
}

/// Apply locally, persist, and roll back on a failed write.
pub fn execute(
    table: &mut ReportTable,
    store: &dyn DocumentStore,
    command: &mut dyn ReportCommand,
) -> Result<()> {
    let id = command.report_id().to_string();
    let report = table
        .report_mut(&id)
        .ok_or_else(|| FactdeskError::NotFound(format!("report {id}")))?;
    command.apply(report)?;
    table.refresh();

    match store.update_document(REPORTS, &id, command.patch()) {
        Ok(()) => {
            tracing::debug!(id = %id, command = %command.describe(), "report updated");
            Ok(())
        }
        Err(e) => {
            tracing::error!(id = %id, command = %command.describe(), error = %e, "update failed, rolling back");
            if let Some(report) = table.report_mut(&id) {
                command.compensate(report);
            }
            table.refresh();
            Err(e)
        }
    }
}

pub struct ToggleRead {
    id: String,
    previous: Option<bool>,
}

impl ToggleRead {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string(), previous: None }
    }
}

impl ReportCommand for ToggleRead {
    fn report_id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> String {
        "toggle read".into()
    }

    fn apply(&mut self, report: &mut Report) -> Result<()> {
        self.previous = Some(report.read);
        report.read = !report.read;
        Ok(())
    }

    fn patch(&self) -> Value {
        json!({ "read": !self.previous.unwrap_or(false) })
    }

    fn compensate(&self, report: &mut Report) {
        if let Some(read) = self.previous {
            report.read = read;
        }
    }
}

pub struct SetLabel {
    id: String,
    label: String,
    previous: Option<String>,
}

impl SetLabel {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            previous: None,
        }
    }
}

impl ReportCommand for SetLabel {
    fn report_id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> String {
        format!("set label {:?}", self.label)
    }

    fn apply(&mut self, report: &mut Report) -> Result<()> {
        self.previous = Some(std::mem::replace(&mut report.label, self.label.clone()));
        Ok(())
    }

    fn patch(&self) -> Value {
        json!({ "label": self.label })
    }

    fn compensate(&self, report: &mut Report) {
        if let Some(label) = &self.previous {
            report.label = label.clone();
        }
    }
}

pub struct SetNote {
    id: String,
    note: String,
    previous: Option<String>,
}

impl SetNote {
    pub fn new(id: &str, note: &str) -> Self {
        Self {
            id: id.to_string(),
            note: note.to_string(),
            previous: None,
        }
    }
}

impl ReportCommand for SetNote {
    fn report_id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> String {
        "set note".into()
    }

    fn apply(&mut self, report: &mut Report) -> Result<()> {
        self.previous = Some(std::mem::replace(&mut report.note, self.note.clone()));
        Ok(())
    }

    fn patch(&self) -> Value {
        json!({ "note": self.note })
    }

    fn compensate(&self, report: &mut Report) {
        if let Some(note) = &self.previous {
            report.note = note.clone();
        }
    }
}

/// Set any top-level report field from an already-typed JSON value.
pub struct EditField {
    id: String,
    field: String,
    value: Value,
    previous: Option<Report>,
}

impl EditField {
    pub fn new(id: &str, field: &str, value: Value) -> Self {
        Self {
            id: id.to_string(),
            field: field.to_string(),
            value,
            previous: None,
        }
    }
}

impl ReportCommand for EditField {
    fn report_id(&self) -> &str {
        &self.id
    }

    fn describe(&self) -> String {
        format!("edit {}", self.field)
    }

    fn apply(&mut self, report: &mut Report) -> Result<()> {
        let mut body = serde_json::to_value(&*report)?;
        if let Value::Object(map) = &mut body {
            map.insert(self.field.clone(), self.value.clone());
        }
        let updated = Report::from_document(&report.id, body).map_err(|e| FactdeskError::InvalidField {
            field: self.field.clone(),
            reason: e.to_string(),
        })?;
        self.previous = Some(std::mem::replace(report, updated));
        Ok(())
    }

    fn patch(&self) -> Value {
        let mut patch = serde_json::Map::new();
        patch.insert(self.field.clone(), self.value.clone());
        Value::Object(patch)
    }

    fn compensate(&self, report: &mut Report) {
        if let Some(previous) = &self.previous {
            *report = previous.clone();
        }
    }
}
