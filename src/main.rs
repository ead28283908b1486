//! Command-line front end for aggregating report folders.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use sheet_summary::config::{ProjectConfig, ReportFormat};
use sheet_summary::execution::{AggregationRequest, TracingObserver};
use sheet_summary::export::{self, DEFAULT_SUMMARY_CHARS, ERROR_LOG_FILE_NAME};
use sheet_summary::ingestion::{load, SheetSelector};
use sheet_summary::listing::{list_tabular_files, ListingOptions, SortKey};
use sheet_summary::types::DataSet;
use tracing::{info, warn};

/// CLI-compatible sort key enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliSortKey {
    /// Natural order of the file name
    Name,
    /// Natural order of the path inside the folder
    Path,
    /// Last modification time
    Modified,
}

impl From<CliSortKey> for SortKey {
    fn from(cli: CliSortKey) -> Self {
        match cli {
            CliSortKey::Name => SortKey::Name,
            CliSortKey::Path => SortKey::Path,
            CliSortKey::Modified => SortKey::Modified,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Aggregate folders of CSV and Excel reports",
    long_about = "Groups every CSV/Excel file of a folder by the keys of a report format, \
                  sums numeric columns, keeps the first value of the others, and merges \
                  the per-file results into one table.\n\n\
                  Folder settings live in <DIR>/project.json."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Args, Debug, Clone, Copy)]
struct SortArgs {
    /// Order in which files are listed and processed
    #[arg(long, value_enum, default_value = "name")]
    sort: CliSortKey,

    /// Reverse the order
    #[arg(long)]
    reverse: bool,
}

impl From<SortArgs> for ListingOptions {
    fn from(args: SortArgs) -> Self {
        ListingOptions {
            sort_by: args.sort.into(),
            reverse: args.reverse,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the files a run would process
    Files {
        dir: PathBuf,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Load one file and print its first rows as CSV
    Preview {
        file: PathBuf,
        /// Number of rows to print
        #[arg(long, default_value = "20")]
        rows: usize,
        /// Worksheet name or zero-based index (defaults to the folder setting)
        #[arg(long)]
        sheet: Option<String>,
        /// Rows to skip before the header row (defaults to the folder setting)
        #[arg(long)]
        header: Option<usize>,
    },
    /// Show or change the folder's sheet and header settings
    Settings {
        dir: PathBuf,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        header: Option<usize>,
    },
    /// Manage report formats
    Formats {
        #[command(subcommand)]
        action: FormatAction,
    },
    /// Aggregate every file of a folder with a report format
    Aggregate {
        dir: PathBuf,
        /// Name of the report format in project.json
        #[arg(short, long)]
        format: String,
        /// Also write the result to <DIR>/<FORMAT>.csv
        #[arg(long)]
        export: bool,
        #[command(flatten)]
        sort: SortArgs,
    },
}

#[derive(Subcommand, Debug)]
enum FormatAction {
    /// Print the folder's report formats
    List { dir: PathBuf },
    /// Add a format, or replace the one with the same name
    Add {
        dir: PathBuf,
        #[arg(long)]
        name: String,
        /// Grouping keys, comma-separated, in grouping order
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Columns to keep, comma-separated
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
    },
    /// Remove a format by name
    Remove {
        dir: PathBuf,
        #[arg(long)]
        name: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout only carries CSV.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet);

    match cli.command {
        Command::Files { dir, sort } => run_files(&dir, sort.into()),
        Command::Preview {
            file,
            rows,
            sheet,
            header,
        } => run_preview(&file, rows, sheet.as_deref(), header),
        Command::Settings { dir, sheet, header } => run_settings(&dir, sheet.as_deref(), header),
        Command::Formats { action } => run_formats(action),
        Command::Aggregate {
            dir,
            format,
            export,
            sort,
        } => run_aggregate(&dir, &format, export, sort.into()),
    }
}

fn run_files(dir: &Path, listing: ListingOptions) -> Result<()> {
    let files = list_tabular_files(dir, &listing)
        .with_context(|| format!("cannot list {}", dir.display()))?;
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}

fn run_preview(file: &Path, rows: usize, sheet: Option<&str>, header: Option<usize>) -> Result<()> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let mut options = ProjectConfig::load(dir)?.load_options();
    if let Some(sheet) = sheet {
        options.sheet = SheetSelector::parse(sheet);
    }
    if let Some(header) = header {
        options.header_row = header;
    }

    let table = load(file, &options)?;
    info!(
        "Loaded {}: {} rows x {} columns",
        file.display(),
        table.row_count(),
        table.column_count()
    );
    let head = DataSet::new(
        table.schema.clone(),
        table.rows.iter().take(rows).cloned().collect(),
    );
    export::write_records(&head, io::stdout().lock())?;
    Ok(())
}

fn run_settings(dir: &Path, sheet: Option<&str>, header: Option<usize>) -> Result<()> {
    let mut project = ProjectConfig::load(dir)?;
    if sheet.is_some() || header.is_some() {
        if let Some(sheet) = sheet {
            project.sheet_name = SheetSelector::parse(sheet);
        }
        if let Some(header) = header {
            project.header = header;
        }
        project.save(dir)?;
    }
    println!("sheet_name: {}", project.sheet_name);
    println!("header: {}", project.header);
    Ok(())
}

fn run_formats(action: FormatAction) -> Result<()> {
    match action {
        FormatAction::List { dir } => {
            let project = ProjectConfig::load(&dir)?;
            for f in &project.formats {
                println!(
                    "{}\tkeys={}\tcolumns={}",
                    f.name,
                    f.keys.join(","),
                    f.columns.join(",")
                );
            }
        }
        FormatAction::Add {
            dir,
            name,
            keys,
            columns,
        } => {
            if name.trim().is_empty() {
                return Err(anyhow!("format name must not be empty"));
            }
            let mut project = ProjectConfig::load(&dir)?;
            let format = ReportFormat::new(name.as_str(), keys, columns);
            match project.formats.iter().position(|f| f.name == name) {
                Some(idx) => {
                    project.replace_format(idx, format);
                    info!("Replaced format '{name}'");
                }
                None => {
                    project.add_format(format);
                    info!("Added format '{name}'");
                }
            }
            project.save(&dir)?;
        }
        FormatAction::Remove { dir, name } => {
            let mut project = ProjectConfig::load(&dir)?;
            if project.remove_format(&name) == 0 {
                return Err(anyhow!("no format named '{name}' in {}", dir.display()));
            }
            project.save(&dir)?;
        }
    }
    Ok(())
}

fn run_aggregate(
    dir: &Path,
    format_name: &str,
    save_csv: bool,
    listing: ListingOptions,
) -> Result<()> {
    let project = ProjectConfig::load(dir)?;
    let format = project
        .format(format_name)
        .cloned()
        .ok_or_else(|| anyhow!("no format named '{format_name}' in {}", dir.display()))?;

    let request = AggregationRequest::new(dir, format, project.load_options())
        .with_listing(listing)
        .with_observer(Arc::new(TracingObserver));
    let result = request.run()?;

    if let Some(table) = &result.table {
        export::write_records(table, io::stdout().lock())?;
        if save_csv {
            let path = export::output_path(dir, format_name)
                .ok_or_else(|| anyhow!("format name is empty, nothing to export"))?;
            export::export_csv(table, &path)?;
            info!("Saved {}", path.display());
        }
    } else {
        warn!("No result table was produced");
    }

    if result.has_errors() {
        let log_path = dir.join(ERROR_LOG_FILE_NAME);
        result.write_error_log(&log_path)?;
        eprintln!("{}", result.summary(DEFAULT_SUMMARY_CHARS));
        eprintln!("See {} for details.", log_path.display());
    }
    Ok(())
}
