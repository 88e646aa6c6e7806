//! DeskPort - account migration entry point

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use deskport_common::config::Config;
use deskport_common::types::ConversationStatus;
use deskport_common::Error;
use deskport_core::{
    export_account, import_snapshot, write_snapshot, ExportOptions, ImportOptions, Snapshot,
    TracingProgress,
};
use deskport_storage::{AccountStore, PgStore};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "deskport",
    about = "Move helpdesk accounts between deployments",
    version
)]
struct Cli {
    /// Config file (defaults to ./deskport.toml, then /etc/deskport/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one account into a snapshot file
    Export(ExportArgs),
    /// Import a snapshot file into this deployment
    Import(ImportArgs),
}

#[derive(Args, Debug)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["account_id", "account_name"])
))]
struct ExportArgs {
    /// Id of the account to export
    #[arg(long)]
    account_id: Option<i64>,

    /// Name of the account to export
    #[arg(long)]
    account_name: Option<String>,

    /// Export at most this many conversations, newest first
    #[arg(long)]
    limit: Option<i64>,

    /// Only conversations with this status (open, resolved, pending,
    /// snoozed); repeatable
    #[arg(long)]
    status: Vec<String>,

    /// Only conversations created on or after this date (YYYY-MM-DD or
    /// RFC 3339)
    #[arg(long)]
    from_date: Option<String>,

    /// Only conversations created on or before this date (YYYY-MM-DD or
    /// RFC 3339)
    #[arg(long)]
    to_date: Option<String>,

    /// Produce a document even when no conversation matches
    #[arg(long)]
    export_empty_account: bool,

    /// Directory the snapshot is written into (defaults to
    /// [export].output_dir)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// Snapshot file to import
    file: PathBuf,

    /// Import into this existing account instead of the account named in
    /// the document
    #[arg(long)]
    account: Option<String>,

    /// Run every phase inside the transaction, then roll it back
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    init_logging(&config.logging.level);

    match cli.command {
        Command::Export(args) => run_export(&config, args).await,
        Command::Import(args) => run_import(&config, args).await,
    }
}

async fn run_export(config: &Config, args: ExportArgs) -> Result<()> {
    let mut statuses = Vec::new();
    for value in &args.status {
        statuses.push(
            value
                .parse::<ConversationStatus>()
                .map_err(Error::Validation)?,
        );
    }
    let from_date = args.from_date.as_deref().map(parse_date).transpose()?;
    let to_date = args.to_date.as_deref().map(parse_date).transpose()?;

    let url = config.database_url()?;
    let mut store = PgStore::connect(&url).await?;

    let account_id = if let Some(id) = args.account_id {
        id
    } else {
        let name = args.account_name.as_deref().unwrap_or_default();
        store
            .account_by_name(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Account '{}' not found", name)))?
            .id
    };

    let options = ExportOptions {
        limit: args.limit,
        status: statuses,
        from_date,
        to_date,
        export_empty_account: args.export_empty_account,
    };
    let snapshot = export_account(&mut store, account_id, &options, &TracingProgress).await?;

    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.export.output_dir.clone());
    let summary = write_snapshot(&snapshot, &output_dir)?;

    println!(
        "Exported {} conversations ({} messages) to {}",
        summary.conversations,
        summary.messages,
        summary.path.display()
    );
    Ok(())
}

async fn run_import(config: &Config, args: ImportArgs) -> Result<()> {
    let data = std::fs::read_to_string(&args.file)
        .map_err(|e| Error::Snapshot(format!("Failed to read {}: {}", args.file.display(), e)))?;
    let snapshot = Snapshot::from_json(&data)?;
    info!(
        account = %snapshot.account.name,
        conversations = snapshot.conversations.len(),
        "Snapshot loaded"
    );

    let url = config.database_url()?;
    let mut store = PgStore::connect(&url).await?;

    let options = ImportOptions {
        target_account_name: args.account,
        dry_run: args.dry_run,
    };
    let report = import_snapshot(&mut store, &snapshot, &options, &TracingProgress).await?;

    println!("{}", report);
    Ok(())
}

/// Accepts a bare date as UTC midnight, or a full RFC 3339 timestamp.
fn parse_date(value: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| {
            Error::Validation(format!(
                "Invalid date '{}', expected YYYY-MM-DD or RFC 3339",
                value
            ))
        })
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
