use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tablefind::config::default_config_path;
use tablefind::config::load_config;
use tablefind::config::DocumentExtractionConfig;
use tablefind::resolver::oracle::ChatCompletionOracle;
use tablefind::resolver::oracle::ClassificationOracle;
use tablefind::resolver::oracle::DisabledOracle;
use tablefind::resolver::resolve_sheets;
use tablefind::resolver::DEFAULT_ORACLE_TIMEOUT;
use tablefind::table::source::expand_inputs;
use tablefind::table::source::load_tables;
use tracing::debug;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Collects extracted tables into a single Excel workbook.
#[derive(Parser, Debug)]
#[command(name = "tablefind", version, about)]
struct Args {
    /// Table dumps (.json, .yaml) or glob patterns matching them
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output workbook
    #[arg(short, long, default_value = "output.xlsx")]
    output: PathBuf,

    /// Extraction configuration
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Put every table on a single sheet with this name
    #[arg(short, long)]
    sheet_name: Option<String>,

    /// Log every grouping and placement decision
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tablefind=debug" } else { "tablefind=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the classification oracle described by the configuration.
/// Falls back to the disabled oracle when the API key is not available.
fn build_oracle(config: &DocumentExtractionConfig) -> Result<Box<dyn ClassificationOracle>> {
    let Some(oracle) = &config.oracle else {
        debug!("no classification oracle configured");
        return Ok(Box::new(DisabledOracle));
    };
    match std::env::var(&oracle.api_key_env) {
        Ok(api_key) => {
            let client = ChatCompletionOracle::new(
                &oracle.endpoint,
                &oracle.model,
                api_key,
                oracle.timeout(),
            )
            .context("Failed to create classification oracle")?;
            Ok(Box::new(client))
        }
        Err(_) => {
            warn!(
                variable = %oracle.api_key_env,
                "API key not set, classification oracle disabled"
            );
            Ok(Box::new(DisabledOracle))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = load_config(&args.config)?;

    let mut tables = Vec::new();
    for path in expand_inputs(&args.inputs)? {
        let loaded = load_tables(&path)?;
        debug!(path = %path.display(), tables = loaded.len(), "loaded table dump");
        tables.extend(loaded);
    }

    let mut preferences = config.preferences.clone();
    if let Some(name) = args.sheet_name {
        preferences.preferred_sheet_names = vec![name];
    }
    let timeout = config
        .oracle
        .as_ref()
        .map_or(DEFAULT_ORACLE_TIMEOUT, |oracle| oracle.timeout());
    let oracle = build_oracle(&config)?;

    let workbook = resolve_sheets(tables, preferences, oracle.as_ref(), timeout).await?;
    tablefind::assembler::assemble(&workbook, &args.output)?;

    println!("Excel workbook created successfully: {}", args.output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("An error occurred: {error:#}");
            ExitCode::FAILURE
        }
    }
}
