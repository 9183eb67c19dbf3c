use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use promprint_cleaning::constants::{DEFAULT_NLS_PREFIX, NLS_SOURCE};
use promprint_cleaning::{logging, metrics};
use promprint_cleaning::{run_nls, run_register, NlsOptions, RegisterConfig, RunSummary};

#[derive(Parser)]
#[command(name = "promprint-clean")]
#[command(about = "General scripts for cleaning promprint data")]
#[command(version)]
struct Cli {
    /// Log progress to the console and save intermediate stages of cleaning
    #[arg(short, long, global = true)]
    debug: bool,

    /// Print the run summary as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Write run counters to this file in Prometheus text format
    #[arg(long, global = true)]
    metrics_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// National Library of Scotland data
    Nls {
        /// Folder of input files in tsv/txt format
        input_folder: PathBuf,
        /// Folder for the formatted output
        output_folder: PathBuf,
        /// Config file (TOML or JSON) with registers to filter
        config_file: PathBuf,
        /// Source library entry to use from the config file
        #[arg(long, default_value = NLS_SOURCE)]
        source: String,
        /// Prefix for export file names
        #[arg(long, default_value = DEFAULT_NLS_PREFIX)]
        prefix: String,
        /// Input file name to leave out (repeatable), e.g. the #45 file
        #[arg(long)]
        exclude: Vec<String>,
    },
    /// Data from the Stationers' Hall registers
    Register {
        /// Register file in csv format
        input_file: PathBuf,
        /// Folder for the formatted output
        output_folder: PathBuf,
    },
}

fn print_report(title: &str, summary: &RunSummary) {
    println!("\n{}:", title);
    println!("   Files processed: {}", summary.files_processed);
    println!("   Files skipped: {}", summary.files_skipped);
    println!("   Rows read: {}", summary.rows_read);
    println!("   Rows skipped: {}", summary.rows_skipped);
    println!("   Rows unrouted: {}", summary.rows_unrouted);
    for (file, rows) in &summary.rows_written {
        println!("   Written to {}: {}", file, rows);
    }
    if !summary.issues.is_empty() {
        println!("\n{} issues encountered:", summary.issues.len());
        for issue in &summary.issues {
            println!("   - {}", issue);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<RunSummary> {
    match cli.command {
        Commands::Nls {
            input_folder,
            output_folder,
            config_file,
            source,
            prefix,
            exclude,
        } => {
            let config = RegisterConfig::load(&config_file)
                .with_context(|| format!("loading config {}", config_file.display()))?;
            let options = NlsOptions {
                source,
                prefix,
                exclude,
                debug: cli.debug,
            };
            let summary = run_nls(&input_folder, &output_folder, &config, &options)
                .context("NLS cleaning failed")?;
            if !cli.json {
                print_report("NLS results", &summary);
            }
            Ok(summary)
        }
        Commands::Register {
            input_file,
            output_folder,
        } => {
            let summary = run_register(&input_file, &output_folder)
                .with_context(|| format!("cleaning register {}", input_file.display()))?;
            if !cli.json {
                print_report("Register results", &summary);
            }
            Ok(summary)
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(cli.debug);

    let metrics_handle = match &cli.metrics_file {
        Some(_) => Some(metrics::install_textfile_recorder()?),
        None => None,
    };
    let metrics_file = cli.metrics_file.clone();
    let json = cli.json;

    let summary = run(cli).inspect_err(|e| error!("Run failed: {:#}", e))?;
    info!("Run completed");

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    if let (Some(handle), Some(path)) = (metrics_handle, metrics_file) {
        metrics::write_textfile(&handle, &path)?;
    }
    Ok(())
}
