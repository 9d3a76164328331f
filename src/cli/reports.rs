use colored::Colorize;
use comfy_table::{Cell, Color, Table};

use crate::context::AppContext;
use crate::error::{FactdeskError, Result};
use crate::fields::{FieldKind, FieldValue};
use crate::fmt::{date_time, or_dash, short_date, truncate};
use crate::models::{Report, REPORTS};
use crate::store::load_reports;
use crate::table::command::{execute, EditField, ReportCommand, SetLabel, SetNote, ToggleRead};
use crate::table::paginate::format_buttons;
use crate::table::{ReadFilter, ReportTable, ReportWeek};

fn load_table(ctx: &AppContext) -> Result<ReportTable> {
    Ok(ReportTable::new(
        load_reports(ctx.store.as_ref())?,
        ctx.settings.rows_per_page,
        ctx.clock.now(),
    ))
}

pub struct ListArgs<'a> {
    pub weeks: &'a str,
    pub read: &'a str,
    pub search: Option<&'a str>,
    pub page: usize,
    pub rows: Option<usize>,
}

pub fn format_table(table: &ReportTable, page_window: usize) -> String {
    let mut out = Table::new();
    out.set_header(vec!["ID", "Date", "", "Agency", "Topic", "Title", "Label"]);
    for report in table.loaded() {
        let read = if report.read {
            Cell::new("")
        } else {
            Cell::new("new").fg(Color::Green)
        };
        out.add_row(vec![
            Cell::new(&report.id),
            Cell::new(short_date(report.created_date)),
            read,
            Cell::new(or_dash(&report.agency)),
            Cell::new(or_dash(&report.topic)),
            Cell::new(truncate(&report.title, 40)),
            Cell::new(&report.label),
        ]);
    }
    let summary = format!(
        "{} reports ({}, {}) | page {}",
        table.filtered().len(),
        table.week().label(),
        table.read_filter().label(),
        format_buttons(&table.page_buttons(page_window)),
    );
    format!("{out}\n{summary}")
}

pub fn list(ctx: &AppContext, args: ListArgs) -> Result<()> {
    let mut table = load_table(ctx)?;
    table.set_week(args.weeks.parse::<ReportWeek>()?);
    table.set_read_filter(args.read.parse::<ReadFilter>()?);
    if let Some(rows) = args.rows {
        table.set_rows_per_page(rows);
    }
    if let Some(search) = args.search {
        table.set_search(search);
    }
    table.set_page(args.page);

    if table.filtered().is_empty() {
        println!("No reports match.");
        return Ok(());
    }
    println!("{}", format_table(&table, ctx.settings.page_window));
    Ok(())
}

pub fn show(ctx: &AppContext, id: &str) -> Result<()> {
    let data = ctx
        .store
        .get_document(REPORTS, id)?
        .ok_or_else(|| FactdeskError::NotFound(format!("report {id}")))?;
    let report = Report::from_document(id, data.clone())?;
    let serde_json::Value::Object(map) = data else {
        return Err(FactdeskError::Other(format!("report {id} is not an object")));
    };

    let mut table = Table::new();
    table.set_header(vec!["Field", "Type", "Value"]);
    table.add_row(vec![Cell::new("id"), Cell::new(""), Cell::new(id)]);
    for (key, value) in &map {
        let field = FieldValue::from_json(value);
        table.add_row(vec![
            Cell::new(key),
            Cell::new(field.kind().name()),
            Cell::new(field.display()),
        ]);
    }
    println!("Report {id}\n{}\n\n{table}", format_report(&report));
    Ok(())
}

fn run_command(ctx: &AppContext, command: &mut dyn ReportCommand) -> Result<Report> {
    let mut table = load_table(ctx)?;
    execute(&mut table, ctx.store.as_ref(), command)?;
    table
        .find(command.report_id())
        .cloned()
        .ok_or_else(|| FactdeskError::NotFound(format!("report {}", command.report_id())))
}

pub fn toggle_read(ctx: &AppContext, id: &str) -> Result<()> {
    let report = run_command(ctx, &mut ToggleRead::new(id))?;
    let state = if report.read { "read".green() } else { "unread".yellow() };
    println!("Marked {id} as {state}");
    Ok(())
}

pub fn label(ctx: &AppContext, id: &str, label: &str) -> Result<()> {
    run_command(ctx, &mut SetLabel::new(id, label))?;
    println!("Labelled {id}: {label}");
    Ok(())
}

pub fn note(ctx: &AppContext, id: &str, note: &str) -> Result<()> {
    run_command(ctx, &mut SetNote::new(id, note))?;
    println!("Saved note on {id}");
    Ok(())
}

/// Parse `value` as the kind the field already holds (string for new fields).
pub fn edit(ctx: &AppContext, id: &str, field: &str, value: &str) -> Result<()> {
    let data = ctx
        .store
        .get_document(REPORTS, id)?
        .ok_or_else(|| FactdeskError::NotFound(format!("report {id}")))?;
    let kind = data
        .get(field)
        .map(|v| FieldValue::from_json(v).kind())
        .unwrap_or(FieldKind::String);
    let parsed = kind.parse(field, value)?;
    run_command(ctx, &mut EditField::new(id, field, parsed.to_json()))?;
    println!("Set {field} ({}) on {id} to {}", kind.name(), parsed.display());
    Ok(())
}

pub fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    let mut table = load_table(ctx)?;
    if table.find(id).is_none() {
        return Err(FactdeskError::NotFound(format!("report {id}")));
    }
    table.delete(ctx.store.as_ref(), id)?;
    println!("Deleted report {id}");
    Ok(())
}

/// Summary block printed above the raw field table.
pub fn format_report(report: &Report) -> String {
    let lines = [
        ("Submitted", date_time(report.created_date)),
        ("Agency", report.agency.clone()),
        ("Location", format!("{} {}", report.city, report.state).trim().to_string()),
        ("Topic", report.topic.clone()),
        ("Source", report.source.clone()),
        ("Title", report.title.clone()),
        ("Detail", report.detail.clone()),
    ];
    lines
        .iter()
        .map(|(label, value)| format!("{label:<10} {}", or_dash(value)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::context::testing::test_context;
    use crate::models::Timestamp;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_format_table_shows_page_and_filters() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let reports: Vec<Report> = (0..12)
            .map(|i| Report {
                id: format!("id{i}"),
                title: format!("Title {i}"),
                created_date: Timestamp::from_datetime(now - Duration::hours(i)),
                ..Report::default()
            })
            .collect();
        let mut table = ReportTable::new(reports, 5, now);
        table.set_page(2);
        let text = format_table(&table, 5);
        assert!(text.contains("id5"));
        assert!(!text.contains("id4 "));
        assert!(text.contains("12 reports (all reports, read and unread) | page 1 [2] 3"));
    }

    #[test]
    fn test_edit_parses_by_existing_kind() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let (_dir, ctx) = test_context(&clock);
        let id = ctx
            .store
            .create_document(REPORTS, json!({"title": "t", "read": false, "createdDate": {"seconds": 0, "nanoseconds": 0}}))
            .unwrap();

        edit(&ctx, &id, "read", "TRUE").unwrap();
        assert_eq!(ctx.store.get_document(REPORTS, &id).unwrap().unwrap()["read"], json!(true));

        assert!(edit(&ctx, &id, "read", "maybe").is_err());

        edit(&ctx, &id, "createdDate", "2024-02-03").unwrap();
        let stored = ctx.store.get_document(REPORTS, &id).unwrap().unwrap();
        assert_eq!(stored["createdDate"]["seconds"], json!(1_706_918_400));
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let clock = FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let (_dir, ctx) = test_context(&clock);
        assert!(matches!(delete(&ctx, "nope"), Err(FactdeskError::NotFound(_))));
    }

    #[test]
    fn test_format_report() {
        let report = Report {
            agency: "County".into(),
            state: "OH".into(),
            title: "T".into(),
            ..Report::default()
        };
        let text = format_report(&report);
        assert!(text.contains("Location   OH"));
        assert!(text.contains("Source     \u{2014}"));
    }
}
