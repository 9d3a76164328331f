//! Read-only views of each wizard step.

use super::form::{FormData, OTHER};
use super::step::Step;
use super::ReportWizard;
use crate::error::Result;
use crate::models::{Report, SOURCES, TOPICS};
use crate::store::{load_agencies, load_options, DocumentStore};

pub const REMINDER: &str = "Reports are reviewed by the agency you choose. \
Do not include personal information about yourself or others, and only \
report content you have seen yourself.";

#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    pub value: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub step: Step,
    pub title: &'static str,
    pub prompt: String,
    pub choices: Vec<Choice>,
    /// (label, value) pairs shown under the prompt.
    pub fields: Vec<(&'static str, String)>,
    pub errors: Vec<(String, String)>,
}

fn choices(names: impl IntoIterator<Item = (String, String)>, selected: &str) -> Vec<Choice> {
    names
        .into_iter()
        .map(|(label, value)| Choice {
            selected: value == selected,
            label,
            value,
        })
        .collect()
}

fn option_choices(store: &dyn DocumentStore, collection: &str, selected: &str) -> Result<Vec<Choice>> {
    let mut names: Vec<(String, String)> = load_options(store, collection)?
        .into_iter()
        .map(|o| (o.name.clone(), o.name))
        .collect();
    names.push((OTHER.to_string(), OTHER.to_string()));
    Ok(choices(names, selected))
}

fn summary_fields(form: &FormData, staged: usize) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("Agency", form.selected_agency.clone()),
        ("Topic", form.effective_topic().to_string()),
        ("Source", form.effective_source().to_string()),
        ("Title", form.title.clone()),
        ("Link", form.link.clone()),
        ("Second link", form.second_link.clone()),
        ("Detail", form.detail.clone()),
        ("Images", form.image_urls.len().to_string()),
    ];
    if staged > 0 {
        fields.push(("Pending uploads", staged.to_string()));
    }
    fields
}

fn report_fields(report: &Report) -> Vec<(&'static str, String)> {
    vec![
        ("Report ID", report.id.clone()),
        ("Submitted", report.created_date.to_rfc3339()),
        ("Agency", report.agency.clone()),
        ("Topic", report.topic.clone()),
        ("Source", report.source.clone()),
        ("Title", report.title.clone()),
        ("Link", report.link.clone()),
        ("Second link", report.second_link.clone()),
        ("Detail", report.detail.clone()),
        ("Images", report.images.join("\n")),
    ]
}

/// Build the view for the wizard's current step.
pub fn render(wizard: &ReportWizard, store: &dyn DocumentStore) -> Result<StepView> {
    let form = wizard.form();
    let step = wizard.step();
    let mut view = StepView {
        step,
        title: step.title(),
        prompt: String::new(),
        choices: Vec::new(),
        fields: Vec::new(),
        errors: wizard
            .errors()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };

    match step {
        Step::Reminder | Step::Intro => {
            view.prompt = REMINDER.to_string();
        }
        Step::Agency => {
            view.prompt = "Which agency should review this report?".into();
            let agencies = load_agencies(store, &[])?;
            view.choices = choices(
                agencies.into_iter().map(|a| {
                    let label = match (a.city.is_empty(), a.state.is_empty()) {
                        (false, false) => format!("{} ({}, {})", a.name, a.city, a.state),
                        (true, false) => format!("{} ({})", a.name, a.state),
                        _ => a.name.clone(),
                    };
                    (label, a.name)
                }),
                &form.selected_agency,
            );
        }
        Step::Topic => {
            view.prompt = "What is the information about?".into();
            view.choices = option_choices(store, TOPICS, &form.selected_topic)?;
            if form.show_other_topic {
                view.fields.push(("Other topic", form.other_topic.clone()));
            }
        }
        Step::Source => {
            view.prompt = "Where did you come across it?".into();
            view.choices = option_choices(store, SOURCES, &form.selected_source)?;
            if form.show_other_source {
                view.fields.push(("Other source", form.other_source.clone()));
            }
        }
        Step::Details => {
            view.prompt = "Give the report a title and describe what you saw.".into();
            view.fields = vec![
                ("Title", form.title.clone()),
                ("Link", form.link.clone()),
                ("Second link", form.second_link.clone()),
                ("Detail", form.detail.clone()),
                ("Images", form.image_urls.len().to_string()),
                ("Pending uploads", wizard.staged_images().len().to_string()),
            ];
        }
        Step::Review => {
            view.prompt = "Check everything below, then submit.".into();
            view.fields = summary_fields(form, wizard.staged_images().len());
        }
        Step::View => {
            view.prompt = "Thank you. Your report has been sent to the agency.".into();
            if let Some(report) = wizard.submitted() {
                view.fields = report_fields(report);
            }
        }
    }
    Ok(view)
}
