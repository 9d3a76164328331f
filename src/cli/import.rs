use std::path::PathBuf;

use colored::Colorize;

use crate::context::AppContext;
use crate::error::Result;
use crate::importer::import_file;

pub fn run(ctx: &AppContext, file: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let result = import_file(
        ctx.store.as_ref(),
        &file_path,
        ctx.settings.agency_match,
        ctx.clock.now(),
    )?;

    println!("{} imported, {} failed", result.imported, result.failed);
    if result.unmatched_agencies > 0 {
        println!(
            "{}",
            format!(
                "{} rows had an agency that did not match any agency in their state; imported with no agency",
                result.unmatched_agencies
            )
            .yellow()
        );
    }
    Ok(())
}
