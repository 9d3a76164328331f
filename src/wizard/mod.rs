//! The report submission wizard.
//!
//! [`ReportWizard`] owns every form field and the draft slot; step views in
//! [`steps`] only read from it. While the wizard sits on an editable step
//! (agency through review) each change is mirrored into the draft cache so an
//! interrupted report can be picked up again on the next mount.

pub mod draft;
pub mod form;
pub mod step;
pub mod steps;

use crate::blobs::image_path;
use crate::context::AppContext;
use crate::error::{FactdeskError, Result};
use crate::models::{Report, Timestamp, REPORTS};
use crate::store::find_agency;

use draft::{open_draft_cache, DraftCache, ReportDraft};
use form::{step_error_keys, validate_step, FieldErrors, FormData, FormField};
use step::Step;

/// A selected file held in memory until the details step is left.
#[derive(Debug, Clone)]
pub struct StagedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(Step),
    /// Validation failed; see [`ReportWizard::errors`].
    Blocked,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(Report),
    Invalid,
}

pub struct ReportWizard<'a> {
    ctx: &'a AppContext,
    drafts: DraftCache<'a>,
    step: Step,
    form: FormData,
    errors: FieldErrors,
    staged: Vec<StagedImage>,
    restored: bool,
    mounting: bool,
    submitted: Option<Report>,
}

impl<'a> ReportWizard<'a> {
    /// Create the wizard at the reminder step and restore the user's draft,
    /// if one is still fresh.
    pub fn mount(ctx: &'a AppContext) -> Self {
        let mut wizard = Self {
            ctx,
            drafts: open_draft_cache(ctx),
            step: Step::Reminder,
            form: FormData::default(),
            errors: FieldErrors::new(),
            staged: Vec::new(),
            restored: false,
            mounting: true,
            submitted: None,
        };
        wizard.enter(Step::Reminder);
        wizard.restore_draft();
        wizard.mounting = false;
        wizard
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn staged_images(&self) -> &[StagedImage] {
        &self.staged
    }

    /// The report created by the last successful submit.
    pub fn submitted(&self) -> Option<&Report> {
        self.submitted.as_ref()
    }

    /// Copy a saved draft into an untouched form. Runs at most once per mount.
    pub fn restore_draft(&mut self) -> bool {
        if self.restored {
            return false;
        }
        self.restored = true;
        if !self.form.is_blank() {
            return false;
        }
        let Some(draft) = self.drafts.get() else {
            if self.drafts.is_expired() {
                tracing::info!(key = self.drafts.key(), "discarded expired draft");
            }
            return false;
        };
        let target = Step::clamp_editable(draft.current_step);
        tracing::info!(key = self.drafts.key(), step = target.number(), "restoring draft");
        self.form = draft.form_data;
        self.errors = draft.errors;
        self.enter(target);
        true
    }

    /// Leave whatever is in progress and start over from the reminder.
    pub fn new_report(&mut self) {
        self.enter(Step::Reminder);
    }

    pub fn start(&mut self) -> Step {
        if self.step.is_reminder() {
            self.enter(Step::Agency);
        }
        self.step
    }

    pub fn select_agency(&mut self, name: &str) {
        self.set_field(FormField::Agency, name);
    }

    pub fn select_topic(&mut self, name: &str) {
        self.set_field(FormField::Topic, name);
    }

    pub fn select_source(&mut self, name: &str) {
        self.set_field(FormField::Source, name);
    }

    pub fn set_field(&mut self, field: FormField, value: &str) {
        let form = &mut self.form;
        match field {
            FormField::Agency => form.selected_agency = value.trim().to_string(),
            FormField::Topic => form.select_topic(value),
            FormField::OtherTopic => form.other_topic = value.to_string(),
            FormField::Source => form.select_source(value),
            FormField::OtherSource => form.other_source = value.to_string(),
            FormField::Title => form.title = value.to_string(),
            FormField::Link => form.link = value.trim().to_string(),
            FormField::SecondLink => form.second_link = value.trim().to_string(),
            FormField::Detail => form.detail = value.to_string(),
        }
        if !value.trim().is_empty() {
            self.errors.remove(field.error_key());
        }
        self.autosave();
    }

    /// Hold a file for upload when the details step is left. Nothing is sent yet.
    pub fn stage_image(&mut self, name: &str, bytes: Vec<u8>) {
        self.staged.push(StagedImage {
            name: name.to_string(),
            bytes,
        });
    }

    pub fn remove_image(&mut self, url: &str) -> bool {
        let before = self.form.image_urls.len();
        self.form.image_urls.retain(|u| u != url);
        let removed = self.form.image_urls.len() != before;
        if removed {
            self.autosave();
        }
        removed
    }

    /// Move forward one step if the current step validates.
    ///
    /// Leaving the details step uploads every staged image first; an upload
    /// failure keeps the wizard on details and is returned as an error. On the
    /// review step this submits the report.
    pub fn next(&mut self) -> Result<Advance> {
        match self.step {
            Step::Reminder | Step::Intro => {
                self.enter(Step::Agency);
                Ok(Advance::Moved(self.step))
            }
            Step::Agency | Step::Topic | Step::Source | Step::Details => {
                if !self.check(self.step) {
                    return Ok(Advance::Blocked);
                }
                if self.step == Step::Details {
                    self.upload_staged()?;
                }
                let next = self.step.next().unwrap_or(Step::Review);
                self.enter(next);
                Ok(Advance::Moved(next))
            }
            Step::Review => match self.submit()? {
                SubmitOutcome::Submitted(_) => Ok(Advance::Moved(self.step)),
                SubmitOutcome::Invalid => Ok(Advance::Blocked),
            },
            Step::View => Ok(Advance::Blocked),
        }
    }

    /// Go back one step. The agency step is the earliest a report can go back
    /// to; the submitted view is final.
    pub fn back(&mut self) -> Step {
        if self.step > Step::FIRST_EDITABLE && self.step.is_editable() {
            if let Some(prev) = self.step.prev() {
                self.enter(prev);
            }
        }
        self.step
    }

    /// Validate everything again and write the report.
    ///
    /// Storage errors leave the wizard on review with the draft intact.
    pub fn submit(&mut self) -> Result<SubmitOutcome> {
        if self.step != Step::Review {
            return Err(FactdeskError::Other(format!(
                "reports can only be submitted from the review step (currently at step {})",
                self.step.number()
            )));
        }
        if !self.check(Step::Review) {
            return Ok(SubmitOutcome::Invalid);
        }

        let store = self.ctx.store.as_ref();
        let agency = find_agency(store, &self.form.selected_agency)?;
        let (city, state) = agency
            .map(|a| (a.city, a.state))
            .unwrap_or_default();
        let mut report = Report {
            id: String::new(),
            user_id: self.ctx.identity.id.clone(),
            email: self.ctx.identity.email.clone(),
            agency: self.form.selected_agency.trim().to_string(),
            topic: self.form.effective_topic().to_string(),
            source: self.form.effective_source().to_string(),
            title: self.form.title.trim().to_string(),
            link: self.form.link.clone(),
            second_link: self.form.second_link.clone(),
            detail: self.form.detail.trim().to_string(),
            images: self.form.image_urls.clone(),
            created_date: Timestamp::from_datetime(self.ctx.clock.now()),
            read: false,
            label: String::new(),
            note: String::new(),
            city,
            state,
        };
        let data = serde_json::to_value(&report)?;
        let id = store.create_document(REPORTS, data).map_err(|e| {
            tracing::error!(error = %e, "failed to submit report");
            e
        })?;
        report.id = id;
        tracing::info!(id = %report.id, "report submitted");

        self.drafts.remove();
        self.submitted = Some(report.clone());
        self.enter(Step::View);
        Ok(SubmitOutcome::Submitted(report))
    }

    fn check(&mut self, step: Step) -> bool {
        let found = validate_step(step, &self.form);
        for key in step_error_keys(step) {
            self.errors.remove(*key);
        }
        let ok = found.is_empty();
        self.errors.extend(found);
        if !ok {
            self.autosave();
        }
        ok
    }

    fn enter(&mut self, step: Step) {
        if step.is_reminder() && !self.mounting {
            self.reset();
        }
        self.step = step;
        self.autosave();
    }

    fn reset(&mut self) {
        self.form = FormData::default();
        self.errors.clear();
        self.staged.clear();
        self.submitted = None;
        self.drafts.remove();
    }

    fn autosave(&mut self) {
        if !self.step.is_editable() {
            return;
        }
        let draft = ReportDraft {
            current_step: self.step.number() as i64,
            form_data: self.form.clone(),
            errors: self.errors.clone(),
            last_saved: self.ctx.clock.now(),
        };
        self.drafts.set(Some(draft));
    }

    /// Upload every staged file concurrently. Successful URLs are kept even
    /// when another upload fails; failed files stay staged for a retry.
    fn upload_staged(&mut self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let blobs = self.ctx.blobs.as_ref();
        let user_id = self.ctx.identity.id.as_str();
        let results: Vec<Result<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .staged
                .iter()
                .map(|image| {
                    scope.spawn(move || {
                        let path = image_path(user_id, &image.name, &image.bytes);
                        blobs.upload_blob(&path, &image.bytes)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(FactdeskError::Upload("upload thread panicked".into())))
                })
                .collect()
        });

        let mut failed = Vec::new();
        for (image, result) in std::mem::take(&mut self.staged).into_iter().zip(results) {
            match result {
                Ok(url) => self.form.image_urls.push(url),
                Err(e) => {
                    tracing::error!(file = %image.name, error = %e, "image upload failed");
                    failed.push(image.name.clone());
                    self.staged.push(image);
                }
            }
        }
        self.autosave();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(FactdeskError::Upload(failed.join(", ")))
        }
    }
}
