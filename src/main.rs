use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

use job_market::apis::adzuna::{extract_all, AdzunaClient, Credentials};
use job_market::config::{Config, DEFAULT_CONFIG_PATH};
use job_market::constants::CLEAN_CSV_FILE;
use job_market::logging;
use job_market::pipeline::{Pipeline, PipelineResult, PipelineStatus};
use job_market::server::{start_server, AppState, DatasetSnapshot, Paging};

#[derive(Parser)]
#[command(name = "job_market")]
#[command(about = "Global job market ETL pipeline and analytics API")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull raw postings from the search API into the raw batch directory
    Extract {
        /// Country codes to fetch (comma-separated). Defaults to every configured country
        #[arg(long)]
        countries: Option<String>,
    },
    /// Rebuild the cleaned dataset from the raw batches on disk
    Transform,
    /// Serve the read-only analytics API over the cleaned dataset
    Serve {
        /// Port to listen on; overrides server.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run extract followed by transform
    Run {
        #[arg(long)]
        countries: Option<String>,
    },
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn run_extract(config: &Config, countries: Option<String>) -> anyhow::Result<()> {
    let credentials = Credentials::from_env()?;
    let client = AdzunaClient::new(&config.source, credentials)?;
    let only = countries.as_deref().map(split_list);

    println!("Extracting job postings...");
    let summary = extract_all(&client, &config.source, &config.paths.raw_dir, only.as_deref())
        .await
        .context("extract failed")?;

    println!("\nExtract Results:");
    println!("   Batch files written: {}", summary.files_written.len());
    println!("   Total jobs: {}", summary.total_jobs);
    for path in &summary.files_written {
        println!("   - {}", path.display());
    }
    Ok(())
}

fn print_result(result: &PipelineResult) {
    println!("\nTransform Results (run {}):", result.run_id);
    if result.status == PipelineStatus::NoInput {
        println!("   No raw batches found; nothing written");
    } else {
        println!("   Batch files loaded: {}", result.files_loaded);
        println!("   Raw records: {}", result.raw_records);
        println!("   Duplicates removed: {}", result.clean.duplicates_removed);
        println!("   Unmapped regions: {}", result.clean.unmapped_region);
        println!("   Clean records: {}", result.clean.output);
        println!(
            "   With salary: {} ({:.1}%)",
            result.kpis.jobs_with_salary, result.kpis.salary_percentage
        );
        println!("   Countries: {}", result.kpis.total_countries);
        println!("   Companies: {}", result.kpis.total_companies);
        for skill in &result.skills {
            println!("   {}: {} ({:.1}%)", skill.skill, skill.count, skill.percentage);
        }
        for path in &result.output_files {
            println!("   Output file: {}", path.display());
        }
    }

    if !result.errors.is_empty() {
        warn!("{} errors encountered during pipeline run", result.errors.len());
        println!("\nErrors encountered:");
        for error in &result.errors {
            println!("   - {}", error);
        }
    }
}

fn run_transform(config: &Config) -> anyhow::Result<()> {
    println!("Running transform pipeline...");
    match Pipeline::run(config) {
        Ok(result) => {
            print_result(&result);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}

async fn run_serve(config: &Config, port: Option<u16>) -> anyhow::Result<()> {
    let dataset_path = config.paths.output_dir.join(CLEAN_CSV_FILE);
    let snapshot = DatasetSnapshot::load(&dataset_path);
    let paging = Paging {
        default_limit: config.server.default_page_size,
        max_limit: config.server.max_page_size,
    };
    let state = AppState::new(snapshot, config.skills.track.clone(), paging);
    start_server(state, &config.server.host, port.unwrap_or(config.server.port)).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    info!(config = %cli.config.display(), "Configuration loaded");

    if let Some(port) = config.server.metrics_port {
        job_market::metrics::init_metrics(port);
    }

    match cli.command {
        Commands::Extract { countries } => run_extract(&config, countries).await?,
        Commands::Transform => run_transform(&config)?,
        Commands::Serve { port } => run_serve(&config, port).await?,
        Commands::Run { countries } => {
            println!("Running full pipeline (extract + transform)...");
            println!("\nStep 1: Extract");
            run_extract(&config, countries).await?;
            println!("\nStep 2: Transform");
            run_transform(&config)?;
            println!("Full pipeline completed");
        }
    }
    Ok(())
}
