//! Filtering and pagination over the full report list.

pub mod command;
pub mod filter;
pub mod paginate;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Report, REPORTS};
use crate::store::DocumentStore;

pub use filter::{ReadFilter, ReportWeek};
pub use paginate::PageButton;

/// Report list plus the filter state the reviewer has chosen.
///
/// `filtered` holds indices into `reports` and is recomputed whenever the
/// list or a filter changes.
#[derive(Debug, Clone)]
pub struct ReportTable {
    reports: Vec<Report>,
    filtered: Vec<usize>,
    week: ReportWeek,
    read_filter: ReadFilter,
    search: String,
    current_page: usize,
    rows_per_page: usize,
    now: DateTime<Utc>,
}

impl ReportTable {
    pub fn new(reports: Vec<Report>, rows_per_page: usize, now: DateTime<Utc>) -> Self {
        let mut table = Self {
            reports,
            filtered: Vec::new(),
            week: ReportWeek::default(),
            read_filter: ReadFilter::default(),
            search: String::new(),
            current_page: 1,
            rows_per_page: rows_per_page.max(1),
            now,
        };
        table.refresh();
        table
    }

    // ------------------------------------------------------------------
    // Filter state. Every setter sends the reviewer back to page 1.
    // ------------------------------------------------------------------

    pub fn set_reports(&mut self, reports: Vec<Report>) {
        self.reports = reports;
        self.reset();
    }

    pub fn set_week(&mut self, week: ReportWeek) {
        self.week = week;
        self.reset();
    }

    pub fn set_read_filter(&mut self, read_filter: ReadFilter) {
        self.read_filter = read_filter;
        self.reset();
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.reset();
    }

    pub fn set_rows_per_page(&mut self, rows: usize) {
        self.rows_per_page = rows.max(1);
        self.reset();
    }

    fn reset(&mut self) {
        self.current_page = 1;
        self.refresh();
    }

    /// Recompute the filtered view, keeping the page when it still exists.
    pub(crate) fn refresh(&mut self) {
        self.filtered = filter::apply(
            &self.reports,
            self.week,
            self.read_filter,
            &self.search,
            self.now,
        );
        self.current_page = self.current_page.clamp(1, self.page_count());
    }

    // ------------------------------------------------------------------
    // Paging
    // ------------------------------------------------------------------

    pub fn set_page(&mut self, page: usize) {
        self.current_page = page.clamp(1, self.page_count());
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page + 1);
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.current_page.saturating_sub(1));
    }

    pub fn page_count(&self) -> usize {
        paginate::page_count(self.filtered.len(), self.rows_per_page)
    }

    pub fn page_buttons(&self, width: usize) -> Vec<PageButton> {
        paginate::page_buttons(self.current_page, self.page_count(), width)
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn filtered(&self) -> Vec<&Report> {
        self.filtered.iter().map(|&i| &self.reports[i]).collect()
    }

    /// The current page of `filtered`.
    pub fn loaded(&self) -> Vec<&Report> {
        let range = paginate::page_range(self.filtered.len(), self.current_page, self.rows_per_page);
        self.filtered[range].iter().map(|&i| &self.reports[i]).collect()
    }

    pub fn find(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub(crate) fn report_mut(&mut self, id: &str) -> Option<&mut Report> {
        self.reports.iter_mut().find(|r| r.id == id)
    }

    pub fn week(&self) -> ReportWeek {
        self.week
    }

    pub fn read_filter(&self) -> ReadFilter {
        self.read_filter
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn rows_per_page(&self) -> usize {
        self.rows_per_page
    }

    /// Delete a report from the store, then from the table.
    pub fn delete(&mut self, store: &dyn DocumentStore, id: &str) -> Result<()> {
        store.delete_document(REPORTS, id)?;
        let remaining: Vec<Report> = self.reports.drain(..).filter(|r| r.id != id).collect();
        tracing::info!(id = %id, "report deleted");
        self.set_reports(remaining);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;
    use crate::models::Timestamp;
    use crate::store::load_reports;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn reports(n: usize) -> Vec<Report> {
        (0..n)
            .map(|i| Report {
                id: format!("r{i}"),
                title: format!("Report {i}"),
                read: i % 2 == 0,
                created_date: Timestamp::from_datetime(now() - Duration::hours(i as i64)),
                ..Report::default()
            })
            .collect()
    }

    #[test]
    fn test_loaded_is_current_page() {
        let mut table = ReportTable::new(reports(25), 10, now());
        assert_eq!(table.page_count(), 3);
        assert_eq!(table.loaded().len(), 10);
        assert_eq!(table.loaded()[0].id, "r0");
        table.set_page(3);
        let ids: Vec<&str> = table.loaded().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r20", "r21", "r22", "r23", "r24"]);
    }

    #[test]
    fn test_set_page_clamps() {
        let mut table = ReportTable::new(reports(25), 10, now());
        table.set_page(9);
        assert_eq!(table.current_page(), 3);
        table.set_page(0);
        assert_eq!(table.current_page(), 1);
        table.prev_page();
        assert_eq!(table.current_page(), 1);
        table.next_page();
        assert_eq!(table.current_page(), 2);
    }

    #[test]
    fn test_filter_changes_reset_page() {
        let mut table = ReportTable::new(reports(40), 10, now());
        table.set_page(3);
        table.set_search("report");
        assert_eq!(table.current_page(), 1);

        table.set_page(2);
        table.set_read_filter(ReadFilter::Read);
        assert_eq!(table.current_page(), 1);
        assert_eq!(table.filtered().len(), 20);

        table.set_page(2);
        table.set_week(ReportWeek::One);
        assert_eq!(table.current_page(), 1);

        table.set_page(2);
        table.set_rows_per_page(5);
        assert_eq!(table.current_page(), 1);

        table.set_page(2);
        table.set_reports(reports(3));
        assert_eq!(table.current_page(), 1);
    }

    #[test]
    fn test_empty_table_has_one_page() {
        let table = ReportTable::new(Vec::new(), 10, now());
        assert_eq!(table.page_count(), 1);
        assert!(table.loaded().is_empty());
    }

    #[test]
    fn test_delete_removes_from_store_and_table() {
        let (_dir, store) = test_store();
        for r in reports(3) {
            store
                .create_document(REPORTS, serde_json::to_value(&r).unwrap())
                .unwrap();
        }
        let mut table = ReportTable::new(load_reports(&store).unwrap(), 10, now());
        let id = table.filtered()[1].id.clone();
        table.delete(&store, &id).unwrap();
        assert!(table.find(&id).is_none());
        assert_eq!(table.filtered().len(), 2);
        assert_eq!(load_reports(&store).unwrap().len(), 2);
    }
}
