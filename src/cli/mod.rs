pub mod browse;
pub mod catalog;
pub mod export;
pub mod import;
pub mod init;
pub mod report;
pub mod reports;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "factdesk",
    version,
    about = "Report misinformation to the agency responsible, and triage incoming reports."
)]
pub struct Cli {
    /// Log filter (e.g. info, debug). RUST_LOG takes precedence.
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up factdesk: choose a data directory and register your email.
    Init {
        /// Path for factdesk data (default: ~/Documents/factdesk)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Email address reports are filed under
        #[arg(long)]
        email: String,
    },
    /// Fill in and submit a report, one step at a time. Progress is saved as a draft.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Review submitted reports.
    Reports {
        #[command(subcommand)]
        command: ReportsCommands,
    },
    /// Manage the agencies reports can be sent to.
    Agencies {
        #[command(subcommand)]
        command: AgencyCommands,
    },
    /// Manage the topics offered by the report wizard.
    Topics {
        #[command(subcommand)]
        command: OptionCommands,
    },
    /// Manage the sources offered by the report wizard.
    Sources {
        #[command(subcommand)]
        command: OptionCommands,
    },
    /// Interactively browse, filter and mark reports.
    Browse,
    /// Print shell completions.
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Discard any draft and start over at the reminder.
    New,
    /// Show the current step.
    Status,
    /// Acknowledge the reminder and begin.
    Start,
    /// Choose the agency that should review the report.
    Agency {
        /// Agency name, as listed by `factdesk agencies list`
        name: String,
    },
    /// Choose what the report is about.
    Topic {
        /// Topic name
        #[arg(required_unless_present = "other")]
        name: Option<String>,
        /// Describe a topic that is not listed (selects "Other")
        #[arg(long)]
        other: Option<String>,
    },
    /// Choose where the information was seen.
    Source {
        /// Source name
        #[arg(required_unless_present = "other")]
        name: Option<String>,
        /// Describe a source that is not listed (selects "Other")
        #[arg(long)]
        other: Option<String>,
    },
    /// Set the title, description and links.
    Details {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        detail: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long = "second-link")]
        second_link: Option<String>,
        /// Remove an already uploaded image by URL
        #[arg(long = "remove-image")]
        remove_image: Vec<String>,
    },
    /// Continue to the next step. On the details step, attached images are uploaded.
    Next {
        /// Image file to attach (repeatable; details step only)
        #[arg(long = "image")]
        images: Vec<String>,
    },
    /// Go back one step.
    Back,
    /// Submit the report from the review step.
    Submit,
}

#[derive(Subcommand)]
pub enum ReportsCommands {
    /// List reports, newest first.
    List {
        /// Look-back window in weeks: 1, 2, 3, 4 or all
        #[arg(long, default_value = "all")]
        weeks: String,
        /// Read status: all, true or false
        #[arg(long, default_value = "all")]
        read: String,
        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Rows per page (default from settings)
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Show every field of one report.
    Show { id: String },
    /// Flip a report between read and unread.
    ToggleRead { id: String },
    /// Set a report's label.
    Label { id: String, label: String },
    /// Set a reviewer note on a report.
    Note { id: String, note: String },
    /// Set any field; the value is parsed according to the field's current type.
    Edit {
        id: String,
        field: String,
        value: String,
    },
    /// Delete a report.
    Delete { id: String },
    /// Export all reports to CSV.
    Export {
        /// Output path (default: <data_dir>/exports/reports-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Import reports from a CSV file.
    Import {
        /// Path to the CSV file
        file: String,
    },
}

#[derive(Subcommand)]
pub enum AgencyCommands {
    /// Add an agency.
    Add {
        /// Agency name, e.g. 'Ohio Department of Health'
        name: String,
        /// Two-letter state code
        #[arg(long)]
        state: String,
        #[arg(long)]
        city: Option<String>,
    },
    /// List agencies.
    List {
        /// Only agencies in this state
        #[arg(long)]
        state: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum OptionCommands {
    /// Add a choice.
    Add { name: String },
    /// List choices.
    List,
}
