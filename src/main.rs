use std::path::PathBuf;
use std::sync::Arc;

use apptrack::config::{AppConfig, MatcherConfig};
use apptrack::error::AppError;
use apptrack::telemetry;
use apptrack::workflows::applications::{
    classify, CsvFileSink, ExportSink, IngestionService, ReconciliationStore, RecordFilter,
};
use apptrack::workflows::mailbox::MailboxImporter;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "Apptrack",
    about = "Reconcile job application emails into a deduplicated tracker",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a mailbox CSV dump and reconcile application records
    Ingest(IngestArgs),
    /// Classify a single email without touching any records
    Classify(ClassifyArgs),
}

#[derive(Args, Debug)]
struct IngestArgs {
    /// Mailbox dump CSV (Company, Title, Subject, Body, Sender, Received At)
    #[arg(long)]
    mailbox: PathBuf,
    /// Write the reconciled export view to this CSV file
    #[arg(long)]
    export: Option<PathBuf>,
    /// Override the title similarity threshold in (0.0, 1.0]
    #[arg(long)]
    threshold: Option<f32>,
    /// Restrict the export to records with this status label
    #[arg(long)]
    status: Option<String>,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    #[arg(long)]
    subject: String,
    #[arg(long, default_value = "")]
    body: String,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => run_ingest(args),
        Command::Classify(args) => run_classify(args),
    }
}

fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if let Some(threshold) = args.threshold {
        config.matcher = MatcherConfig::new(threshold).ok_or_else(|| {
            apptrack::config::ConfigError::InvalidThreshold {
                value: threshold.to_string(),
            }
        })?;
    }

    let emails = MailboxImporter::from_path(&args.mailbox)?;
    info!(
        ?config.environment,
        count = emails.len(),
        mailbox = %args.mailbox.display(),
        "mailbox dump loaded"
    );

    let store = Arc::new(ReconciliationStore::new(config.matcher));
    let service = IngestionService::new(store.clone());
    let summary = service.ingest_batch(emails);

    let stats = store.stats();
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "summary": summary,
            "stats": stats,
            "rejections": store.rejection_stats(),
        }))
        .unwrap_or_default()
    );

    if let Some(path) = args.export {
        let filter = RecordFilter {
            status: args.status.as_deref().and_then(parse_status),
            ..RecordFilter::default()
        };
        let rows = store.export_view_filtered(&filter);
        let sink = CsvFileSink::new(path.clone());
        sink.publish(&rows)?;
        info!(rows = rows.len(), path = %path.display(), "export written");
    }

    Ok(())
}

fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let category = classify(&args.subject, &args.body);
    println!("{}", category.label());
    Ok(())
}

fn parse_status(raw: &str) -> Option<apptrack::workflows::applications::ApplicationStatus> {
    use apptrack::workflows::applications::ApplicationStatus::*;
    match raw.trim().to_ascii_lowercase().as_str() {
        "applied" => Some(Applied),
        "under_review" => Some(UnderReview),
        "interview" => Some(Interview),
        "offer" => Some(Offer),
        "rejected" => Some(Rejected),
        "withdrawn" => Some(Withdrawn),
        _ => None,
    }
}
