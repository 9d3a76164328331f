use std::path::PathBuf;

use crate::context::AppContext;
use crate::error::Result;
use crate::exporter::{default_export_path, export_to_path};

pub fn run(ctx: &AppContext, output: Option<String>) -> Result<()> {
    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_export_path(&ctx.settings.data_path(), ctx.clock.now()));
    let rows = export_to_path(ctx.store.as_ref(), &path)?;
    println!("Wrote {rows} reports to {}", path.display());
    Ok(())
}
