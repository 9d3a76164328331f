use crate::browser::ReportsBrowser;
use crate::context::AppContext;
use crate::error::Result;
use crate::store::load_reports;
use crate::table::ReportTable;

pub fn run(ctx: &AppContext) -> Result<()> {
    let reports = load_reports(ctx.store.as_ref())?;
    let table = ReportTable::new(reports, ctx.settings.rows_per_page, ctx.clock.now());
    let mut browser = ReportsBrowser::new(table, ctx.settings.page_window);
    browser.run(ctx.store.as_ref())
}
