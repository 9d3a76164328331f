mod blobs;
mod browser;
mod cache;
mod cli;
mod clock;
mod context;
mod db;
mod error;
mod exporter;
mod fields;
mod fmt;
mod importer;
mod kv;
mod models;
mod settings;
mod store;
mod table;
mod tui;
mod wizard;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{AgencyCommands, Cli, Commands, OptionCommands, ReportCommands, ReportsCommands};
use context::AppContext;
use models::{SOURCES, TOPICS};
use settings::{load_settings, require_settings};

/// Logs go to stderr so command output stays pipeable. `RUST_LOG` wins over
/// `--log-level`, which wins over the saved setting.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn open_context() -> anyhow::Result<AppContext> {
    let settings = require_settings()?;
    let data_dir = settings.data_dir.clone();
    AppContext::open(settings).with_context(|| format!("could not open data directory {data_dir}"))
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init { data_dir, email } => cli::init::run(data_dir, &email)?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "factdesk", &mut std::io::stdout());
        }
        Commands::Report { command } => {
            let ctx = open_context()?;
            match command {
                ReportCommands::New => cli::report::new(&ctx)?,
                ReportCommands::Status => cli::report::status(&ctx)?,
                ReportCommands::Start => cli::report::start(&ctx)?,
                ReportCommands::Agency { name } => cli::report::agency(&ctx, &name)?,
                ReportCommands::Topic { name, other } => {
                    cli::report::topic(&ctx, name.as_deref(), other.as_deref())?
                }
                ReportCommands::Source { name, other } => {
                    cli::report::source(&ctx, name.as_deref(), other.as_deref())?
                }
                ReportCommands::Details {
                    title,
                    detail,
                    link,
                    second_link,
                    remove_image,
                } => cli::report::details(
                    &ctx,
                    cli::report::DetailsArgs {
                        title: title.as_deref(),
                        detail: detail.as_deref(),
                        link: link.as_deref(),
                        second_link: second_link.as_deref(),
                        remove_images: &remove_image,
                    },
                )?,
                ReportCommands::Next { images } => cli::report::next(&ctx, &images)?,
                ReportCommands::Back => cli::report::back(&ctx)?,
                ReportCommands::Submit => cli::report::submit(&ctx)?,
            }
        }
        Commands::Reports { command } => {
            let ctx = open_context()?;
            match command {
                ReportsCommands::List {
                    weeks,
                    read,
                    search,
                    page,
                    rows,
                } => cli::reports::list(
                    &ctx,
                    cli::reports::ListArgs {
                        weeks: &weeks,
                        read: &read,
                        search: search.as_deref(),
                        page,
                        rows,
                    },
                )?,
                ReportsCommands::Show { id } => cli::reports::show(&ctx, &id)?,
                ReportsCommands::ToggleRead { id } => cli::reports::toggle_read(&ctx, &id)?,
                ReportsCommands::Label { id, label } => cli::reports::label(&ctx, &id, &label)?,
                ReportsCommands::Note { id, note } => cli::reports::note(&ctx, &id, &note)?,
                ReportsCommands::Edit { id, field, value } => {
                    cli::reports::edit(&ctx, &id, &field, &value)?
                }
                ReportsCommands::Delete { id } => cli::reports::delete(&ctx, &id)?,
                ReportsCommands::Export { output } => cli::export::run(&ctx, output)?,
                ReportsCommands::Import { file } => cli::import::run(&ctx, &file)
                    .with_context(|| format!("importing {file}"))?,
            }
        }
        Commands::Agencies { command } => {
            let ctx = open_context()?;
            let store = ctx.store.as_ref();
            match command {
                AgencyCommands::Add { name, state, city } => {
                    cli::catalog::add_agency(store, &name, &state, city.as_deref())?
                }
                AgencyCommands::List { state } => cli::catalog::list_agencies(store, state.as_deref())?,
            }
        }
        Commands::Topics { command } => {
            let ctx = open_context()?;
            match command {
                OptionCommands::Add { name } => cli::catalog::add_option(ctx.store.as_ref(), TOPICS, &name)?,
                OptionCommands::List => cli::catalog::list_options(ctx.store.as_ref(), TOPICS)?,
            }
        }
        Commands::Sources { command } => {
            let ctx = open_context()?;
            match command {
                OptionCommands::Add { name } => cli::catalog::add_option(ctx.store.as_ref(), SOURCES, &name)?,
                OptionCommands::List => cli::catalog::list_options(ctx.store.as_ref(), SOURCES)?,
            }
        }
        Commands::Browse => cli::browse::run(&open_context()?)?,
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| load_settings().log_level);
    init_logging(&level);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
