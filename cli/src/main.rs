//! chainlog: tamper-evident audit log CLI
//!
//! Appends actions to the hash chain, verifies it, and reports on it.
//!
//! Usage:
//!   chainlog append "File created: C:/Users/a/notes.txt"
//!   chainlog batch "App focus: notepad.exe" "Screen locked"
//!   tail -f events.txt | chainlog batch -
//!   chainlog verify
//!   chainlog query --since today --contains downloads
//!   chainlog summary --type "File created" --group detail --export-html report.html
//!   chainlog apps --since yesterday --by exe-title --export-csv sessions.csv
//!   chainlog input --bucket minute --top 5

use std::fs::File;
use std::io::{self, BufRead, BufWriter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use chainlog_config::ChainlogConfig;
use chainlog_contracts::{BatchOutcome, ChainError, EntryFilter};
use chainlog_core::{Appender, ChainStore};
use chainlog_report::{
    app_usage_from_store, humanize_secs, input_activity_from_store, input_activity::INPUT_HEADERS,
    render_table, resolve_bound, resolve_upper_bound, summarize_store, write_csv,
    write_events_csv, write_html, write_json, write_sessions_csv, write_table_csv,
    write_table_html, ActionLine, AppGroupBy, Bucket, GroupBy,
};
use chainlog_store::SqliteChainStore;
use chainlog_verify::ChainVerifier;

mod error;

use error::{CliError, CliResult};

// ── CLI definition ────────────────────────────────────────────────────────────

/// chainlog: append-only, SHA-256 hash-chained audit log.
#[derive(Parser)]
#[command(
    name = "chainlog",
    about = "Tamper-evident audit log",
    long_about = "Appends actions to a SHA-256 hash chain stored in SQLite,\n\
                  verifies that no entry was altered, removed or reordered,\n\
                  and summarizes the recorded activity."
)]
struct Cli {
    /// Configuration file (defaults to $CHAINLOG_CONFIG, then built-in defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configuration.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append one action.
    Append { action: String },
    /// Append several actions in order; `-` reads one action per line from stdin.
    Batch {
        #[arg(required = true)]
        actions: Vec<String>,
    },
    /// Verify the chain, or the id range `--from..=--to`.
    Verify {
        #[arg(long, default_value_t = 1)]
        from: u64,
        #[arg(long)]
        to: Option<u64>,
    },
    /// List entries matching a filter.
    Query {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// Count entries by action kind or detail.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = Group::Kind)]
        group: Group,
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Also write the matching rows as CSV.
        #[arg(long, value_name = "FILE")]
        export_csv: Option<PathBuf>,
        /// Also write the matching entries, hashes included, as JSON.
        #[arg(long, value_name = "FILE")]
        export_json: Option<PathBuf>,
        /// Also write the matching rows as an HTML page.
        #[arg(long, value_name = "FILE")]
        export_html: Option<PathBuf>,
    },
    /// Sessions and total focus time per application.
    Apps {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = AppGroup::Exe)]
        by: AppGroup,
        #[arg(long, default_value_t = 25)]
        top: usize,
        /// Also write every session as CSV.
        #[arg(long, value_name = "FILE")]
        export_csv: Option<PathBuf>,
    },
    /// Keyboard and mouse activity per time bucket.
    Input {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t = BucketArg::Hour)]
        bucket: BucketArg,
        /// Show only the N most active buckets (0 = all, in time order).
        #[arg(long, default_value_t = 0)]
        top: usize,
        /// Also write the bucket table as CSV.
        #[arg(long, value_name = "FILE")]
        export_csv: Option<PathBuf>,
        /// Also write the bucket table as an HTML page.
        #[arg(long, value_name = "FILE")]
        export_html: Option<PathBuf>,
        /// Also write the individual input events as CSV.
        #[arg(long, value_name = "FILE")]
        export_events_csv: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Lower bound: `today`, `yesterday`, or an ISO timestamp / date.
    #[arg(long)]
    since: Option<String>,
    /// Upper bound, inclusive; a bare date covers the whole day.
    #[arg(long)]
    until: Option<String>,
    /// Text the action must contain, ignoring ASCII case.
    #[arg(long)]
    contains: Option<String>,
    /// Text the action type (before the first `:`) must contain.
    #[arg(long = "type", value_name = "TYPE")]
    kind: Option<String>,
    /// Maximum number of rows (0 = all).
    #[arg(long, default_value_t = 0)]
    limit: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum Group {
    Kind,
    Detail,
}

#[derive(Clone, Copy, ValueEnum)]
enum AppGroup {
    Exe,
    ExeTitle,
}

#[derive(Clone, Copy, ValueEnum)]
enum BucketArg {
    Minute,
    Hour,
    Day,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("chainlog: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<ExitCode> {
    let mut config = ChainlogConfig::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.store.path = db;
    }

    let store: Arc<dyn ChainStore> = Arc::new(SqliteChainStore::open(
        &config.store.path,
        config.store.busy_timeout(),
    )?);

    match cli.command {
        Command::Append { action } => run_append(&config, store, &action),
        Command::Batch { actions } => run_batch(&config, store, actions),
        Command::Verify { from, to } => run_verify(&config, store, from, to),
        Command::Query { filter, format } => run_query(store, &filter, format),
        Command::Summary {
            filter,
            group,
            top,
            export_csv,
            export_json,
            export_html,
        } => run_summary(
            store,
            &filter,
            group,
            top,
            Exports {
                csv: export_csv,
                json: export_json,
                html: export_html,
            },
        ),
        Command::Apps {
            filter,
            by,
            top,
            export_csv,
        } => run_apps(store, &filter, by, top, export_csv),
        Command::Input {
            filter,
            bucket,
            top,
            export_csv,
            export_html,
            export_events_csv,
        } => run_input(
            store,
            &filter,
            bucket,
            top,
            Exports {
                csv: export_csv,
                json: None,
                html: export_html,
            },
            export_events_csv,
        ),
    }
}

/// Optional report files requested on the command line.
struct Exports {
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
    html: Option<PathBuf>,
}

// ── Producers ─────────────────────────────────────────────────────────────────

fn appender(config: &ChainlogConfig, store: Arc<dyn ChainStore>) -> Appender {
    Appender::new(store).with_max_retries(config.append.max_retries)
}

fn run_append(config: &ChainlogConfig, store: Arc<dyn ChainStore>, action: &str) -> CliResult<ExitCode> {
    let entry = appender(config, store).append(action)?;
    print_json(&entry.receipt())?;
    Ok(ExitCode::SUCCESS)
}

fn run_batch(
    config: &ChainlogConfig,
    store: Arc<dyn ChainStore>,
    actions: Vec<String>,
) -> CliResult<ExitCode> {
    let actions = if actions == ["-"] {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(CliError::io("failed to read actions from stdin"))?
    } else {
        actions
    };

    // Chunked so one large input does not hold the writer role throughout.
    let appender = appender(config, store);
    let mut total = BatchOutcome::default();
    for chunk in actions.chunks(config.append.max_batch) {
        match appender.batch_append(chunk) {
            Ok(outcome) => total.logged.extend(outcome.logged),
            Err(ChainError::BatchAborted { committed, reason }) => {
                return Err(ChainError::BatchAborted {
                    committed: total.logged.len() + committed,
                    reason,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    total.count = total.logged.len();

    info!(submitted = actions.len(), count = total.count, "batch complete");
    print_json(&total.receipt())?;
    Ok(ExitCode::SUCCESS)
}

// ── Verification ──────────────────────────────────────────────────────────────

fn run_verify(
    config: &ChainlogConfig,
    store: Arc<dyn ChainStore>,
    from: u64,
    to: Option<u64>,
) -> CliResult<ExitCode> {
    let report = ChainVerifier::new(store)
        .with_page_size(config.verify.page_size)
        .verify_range(from, to.unwrap_or(u64::MAX))?;

    print_json(&report.to_response())?;
    Ok(if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

// ── Reporting ─────────────────────────────────────────────────────────────────

fn build_filter(args: &FilterArgs) -> CliResult<EntryFilter> {
    let now = Utc::now();
    let mut filter = EntryFilter::default();
    if let Some(since) = &args.since {
        filter = filter.since(resolve_bound(since, now)?);
    }
    if let Some(until) = &args.until {
        filter = filter.until(resolve_upper_bound(until, now)?);
    }
    if let Some(contains) = &args.contains {
        filter = filter.contains(contains.clone());
    }
    if let Some(kind) = &args.kind {
        filter = filter.kind(kind.clone());
    }
    if args.limit > 0 {
        filter = filter.limit(args.limit);
    }
    debug!(?filter, "resolved filter");
    Ok(filter)
}

fn run_query(store: Arc<dyn ChainStore>, args: &FilterArgs, format: Format) -> CliResult<ExitCode> {
    let entries = store.query(&build_filter(args)?)?;

    match format {
        Format::Json => write_json(&entries, io::stdout().lock()).map_err(stdout_error())?,
        Format::Csv => write_csv(&entries, io::stdout().lock()).map_err(stdout_error())?,
        Format::Table => {
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| {
                    let line = ActionLine::parse(&e.action);
                    vec![e.id.to_string(), e.timestamp.clone(), line.kind, line.detail]
                })
                .collect();
            print_table(&["ID", "Timestamp", "Action Type", "Detail"], &rows);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_summary(
    store: Arc<dyn ChainStore>,
    args: &FilterArgs,
    group: Group,
    top: usize,
    exports: Exports,
) -> CliResult<ExitCode> {
    let filter = build_filter(args)?;
    let by = match group {
        Group::Kind => GroupBy::Kind,
        Group::Detail => GroupBy::Detail,
    };

    let summary = summarize_store(store.as_ref(), &filter, by, top)?;
    println!("{} matching entries", summary.total);
    let rows: Vec<Vec<String>> = summary
        .groups
        .iter()
        .map(|(key, count)| vec![key.clone(), count.to_string()])
        .collect();
    print_table(&["Item", "Count"], &rows);

    if exports.csv.is_some() || exports.json.is_some() || exports.html.is_some() {
        let entries = store.query(&filter)?;
        if let Some(path) = exports.csv {
            write_csv(&entries, create(&path)?).map_err(write_error(&path))?;
            println!("Exported CSV: {}", path.display());
        }
        if let Some(path) = exports.json {
            write_json(&entries, create(&path)?).map_err(write_error(&path))?;
            println!("Exported JSON: {}", path.display());
        }
        if let Some(path) = exports.html {
            write_html(&entries, "Audit Log Report", create(&path)?).map_err(write_error(&path))?;
            println!("Exported HTML: {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_apps(
    store: Arc<dyn ChainStore>,
    args: &FilterArgs,
    by: AppGroup,
    top: usize,
    export_csv: Option<PathBuf>,
) -> CliResult<ExitCode> {
    let filter = build_filter(args)?;
    let by = match by {
        AppGroup::Exe => AppGroupBy::Exe,
        AppGroup::ExeTitle => AppGroupBy::ExeAndTitle,
    };

    let report = app_usage_from_store(store.as_ref(), &filter, by, top)?;
    println!("App usage: {} sessions", report.sessions.len());
    print_range(&filter);

    let rows: Vec<Vec<String>> = report
        .apps
        .iter()
        .map(|app| {
            let mut row = vec![app.exe.clone()];
            row.extend(app.title.clone());
            row.extend([
                app.sessions.to_string(),
                humanize_secs(app.total_secs),
                app.first_seen.clone(),
                app.last_seen.clone(),
            ]);
            row
        })
        .collect();
    let headers: &[&str] = match by {
        AppGroupBy::Exe => &["Executable", "Sessions", "Total Time", "First Seen", "Last Seen"],
        AppGroupBy::ExeAndTitle => &[
            "Executable",
            "Window Title",
            "Sessions",
            "Total Time",
            "First Seen",
            "Last Seen",
        ],
    };
    print_table(headers, &rows);

    if let Some(path) = export_csv {
        write_sessions_csv(&report.sessions, create(&path)?).map_err(write_error(&path))?;
        println!("Exported details to: {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn run_input(
    store: Arc<dyn ChainStore>,
    args: &FilterArgs,
    bucket: BucketArg,
    top: usize,
    exports: Exports,
    export_events_csv: Option<PathBuf>,
) -> CliResult<ExitCode> {
    let filter = build_filter(args)?;
    let bucket = match bucket {
        BucketArg::Minute => Bucket::Minute,
        BucketArg::Hour => Bucket::Hour,
        BucketArg::Day => Bucket::Day,
    };

    let activity = input_activity_from_store(store.as_ref(), &filter, bucket)?;
    println!("Input activity by {:?}", bucket);
    print_range(&filter);
    print_table(&INPUT_HEADERS, &activity.rows(top));

    let all_rows = activity.rows(0);
    if let Some(path) = exports.csv {
        write_table_csv(&INPUT_HEADERS, &all_rows, create(&path)?).map_err(write_error(&path))?;
        println!("Exported CSV summary: {}", path.display());
    }
    if let Some(path) = exports.html {
        let title = format!("Input Activity Summary ({:?})", bucket);
        write_table_html(&title, &INPUT_HEADERS, &all_rows, create(&path)?)
            .map_err(write_error(&path))?;
        println!("Exported HTML summary: {}", path.display());
    }
    match export_events_csv {
        Some(path) if !activity.events.is_empty() => {
            write_events_csv(&activity.events, create(&path)?).map_err(write_error(&path))?;
            println!("Exported CSV events: {}", path.display());
        }
        Some(_) => println!("No input events to export"),
        None => {}
    }
    Ok(ExitCode::SUCCESS)
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(no data)");
    } else {
        print!("{}", render_table(headers, rows));
    }
}

fn print_range(filter: &EntryFilter) {
    if filter.since.is_some() || filter.until.is_some() {
        println!(
            "Range: {} to {}",
            filter.since.as_deref().unwrap_or("beginning"),
            filter.until.as_deref().unwrap_or("now")
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}

fn create(path: &Path) -> CliResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(CliError::io(format!("cannot create '{}'", path.display())))
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> CliError {
    CliError::io(format!("failed to write '{}'", path.display()))
}

fn stdout_error() -> impl FnOnce(io::Error) -> CliError {
    CliError::io("failed to write output")
}
