use crate::infra::{evaluation_engine, load_rule_table, DirectoryObjectStore};
use clap::{Args, ValueEnum};
use claim_scan::config::AppConfig;
use claim_scan::error::AppError;
use claim_scan::telemetry;
use claim_scan::workflows::scan::{
    FileDescriptor, ObjectStore, ScanId, StorageError, SummaryReport,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Directory holding the packet files (not searched recursively)
    pub(crate) dir: PathBuf,
    /// Output format for the evaluation
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
    /// JSON rule table overriding weights and severity classes
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RulesArgs {
    /// JSON rule table to validate and print instead of the configured one
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

/// Describe every file in the store root the way a bucket listing would.
pub(crate) fn describe_directory<S: ObjectStore + ?Sized>(
    store: &S,
) -> Result<Vec<FileDescriptor>, StorageError> {
    Ok(store
        .list("")?
        .into_iter()
        .map(|object| FileDescriptor {
            path: object.name.clone(),
            name: object.name,
            mime: object.mime.unwrap_or_default(),
            size: object.size.unwrap_or(0),
        })
        .collect())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if !std::fs::metadata(&args.dir)?.is_dir() {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} is not a directory", args.dir.display()),
        )));
    }

    let engine = evaluation_engine(args.rules.as_deref(), Some(&config.scan))?;
    let store = DirectoryObjectStore::new(args.dir.clone());
    let files = describe_directory(&store)?;
    let result = engine.evaluate(&files, &store)?;

    info!(
        dir = %args.dir.display(),
        files = files.len(),
        score = result.score,
        status = %result.status,
        "local packet evaluated"
    );

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            let label = ScanId(args.dir.display().to_string());
            print!("{}", SummaryReport::new(label, result).render());
        }
    }

    Ok(())
}

pub(crate) fn run_rules(args: RulesArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let table = load_rule_table(args.rules.as_deref(), Some(&config.scan))?;
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
