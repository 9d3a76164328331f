use std::path::Path;

use colored::Colorize;

use crate::context::AppContext;
use crate::error::{FactdeskError, Result};
use crate::store::{load_agencies, DocumentStore};
use crate::wizard::form::{FormField, OTHER};
use crate::wizard::step::Step;
use crate::wizard::steps::{render, StepView};
use crate::wizard::{Advance, ReportWizard};

/// Render a step view for the terminal.
pub fn format_view(view: &StepView) -> String {
    let mut out = Vec::new();
    out.push(format!(
        "{} {}",
        format!("[{}/{}]", view.step.number(), Step::View.number()).dimmed(),
        view.title.bold()
    ));
    if !view.prompt.is_empty() {
        out.push(textwrap::fill(&view.prompt, 78));
    }
    if !view.choices.is_empty() {
        out.push(String::new());
        for choice in &view.choices {
            if choice.selected {
                out.push(format!("  {} {}", "*".green(), choice.label.green()));
            } else {
                out.push(format!("    {}", choice.label));
            }
        }
    }
    if !view.fields.is_empty() {
        out.push(String::new());
        let width = view.fields.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
        for (label, value) in &view.fields {
            let value = if value.is_empty() { "\u{2014}".dimmed().to_string() } else { value.clone() };
            out.push(format!("  {:<width$}  {}", format!("{label}:"), value, width = width + 1));
        }
    }
    if !view.errors.is_empty() {
        out.push(String::new());
        for (_, message) in &view.errors {
            out.push(format!("  {}", message.red()));
        }
    }
    out.join("\n")
}

fn show(wizard: &ReportWizard, ctx: &AppContext) -> Result<()> {
    let view = render(wizard, ctx.store.as_ref())?;
    println!("{}", format_view(&view));
    Ok(())
}

fn require_editable(wizard: &ReportWizard) -> Result<()> {
    if wizard.step().is_editable() {
        Ok(())
    } else if wizard.step() == Step::View {
        Err(FactdeskError::Other(
            "this report was already submitted; run `factdesk report new` to file another".into(),
        ))
    } else {
        Err(FactdeskError::Other(
            "no report in progress; run `factdesk report start` first".into(),
        ))
    }
}

pub fn new(ctx: &AppContext) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    wizard.new_report();
    show(&wizard, ctx)
}

pub fn status(ctx: &AppContext) -> Result<()> {
    let wizard = ReportWizard::mount(ctx);
    show(&wizard, ctx)
}

pub fn start(ctx: &AppContext) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    wizard.start();
    show(&wizard, ctx)
}

/// The stored agency name matching `name`, ignoring case and surrounding space.
fn resolve_agency(store: &dyn DocumentStore, name: &str) -> Result<String> {
    let wanted = name.trim();
    let agencies = load_agencies(store, &[])?;
    agencies
        .iter()
        .find(|a| a.name == wanted)
        .or_else(|| agencies.iter().find(|a| a.name.eq_ignore_ascii_case(wanted)))
        .map(|a| a.name.clone())
        .ok_or_else(|| FactdeskError::InvalidField {
            field: "agency".into(),
            reason: format!("no agency named \"{wanted}\"; see `factdesk agencies list`"),
        })
}

pub fn agency(ctx: &AppContext, name: &str) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    require_editable(&wizard)?;
    let name = resolve_agency(ctx.store.as_ref(), name)?;
    wizard.select_agency(&name);
    show(&wizard, ctx)
}

pub fn topic(ctx: &AppContext, name: Option<&str>, other: Option<&str>) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    require_editable(&wizard)?;
    match other {
        Some(text) => {
            wizard.select_topic(OTHER);
            wizard.set_field(FormField::OtherTopic, text);
        }
        None => wizard.select_topic(name.unwrap_or_default()),
    }
    show(&wizard, ctx)
}

pub fn source(ctx: &AppContext, name: Option<&str>, other: Option<&str>) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    require_editable(&wizard)?;
    match other {
        Some(text) => {
            wizard.select_source(OTHER);
            wizard.set_field(FormField::OtherSource, text);
        }
        None => wizard.select_source(name.unwrap_or_default()),
    }
    show(&wizard, ctx)
}

pub struct DetailsArgs<'a> {
    pub title: Option<&'a str>,
    pub detail: Option<&'a str>,
    pub link: Option<&'a str>,
    pub second_link: Option<&'a str>,
    pub remove_images: &'a [String],
}

pub fn details(ctx: &AppContext, args: DetailsArgs) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    require_editable(&wizard)?;
    let fields = [
        (FormField::Title, args.title),
        (FormField::Detail, args.detail),
        (FormField::Link, args.link),
        (FormField::SecondLink, args.second_link),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            wizard.set_field(field, value);
        }
    }
    for url in args.remove_images {
        if !wizard.remove_image(url) {
            println!("{} {url}", "No uploaded image".yellow());
        }
    }
    show(&wizard, ctx)
}

pub fn next(ctx: &AppContext, images: &[String]) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    if !images.is_empty() {
        if wizard.step() != Step::Details {
            return Err(FactdeskError::Other(
                "images can only be attached on the details step".into(),
            ));
        }
        for image in images {
            let path = Path::new(image);
            let bytes = std::fs::read(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| image.clone());
            wizard.stage_image(&name, bytes);
        }
    }

    let outcome = wizard.next();
    show(&wizard, ctx)?;
    match outcome? {
        Advance::Moved(Step::View) => {
            if let Some(report) = wizard.submitted() {
                println!("\n{} {}", "Submitted report".green().bold(), report.id);
            }
        }
        Advance::Moved(_) => {}
        Advance::Blocked => {
            if wizard.step() == Step::View {
                println!("\nRun `factdesk report new` to file another report.");
            }
        }
    }
    Ok(())
}

pub fn back(ctx: &AppContext) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    wizard.back();
    show(&wizard, ctx)
}

pub fn submit(ctx: &AppContext) -> Result<()> {
    let mut wizard = ReportWizard::mount(ctx);
    if wizard.step() != Step::Review {
        return Err(FactdeskError::Other(format!(
            "the report is on step {} ({}); reports are submitted from the review step",
            wizard.step().number(),
            wizard.step().title()
        )));
    }
    let outcome = wizard.submit();
    show(&wizard, ctx)?;
    if let crate::wizard::SubmitOutcome::Submitted(report) = outcome? {
        println!("\n{} {}", "Submitted report".green().bold(), report.id);
    }
    Ok(())
}
