//! lensprep CLI
//!
//! Cuts a MovieLens release down to a small, referentially consistent
//! subset that loads cleanly into a relational schema.

mod config;
mod progress;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use lensprep_core::Pipeline;
use lensprep_formats::{
    count_rows, load_dataset_with_progress, write_dataset, Error as FormatError, Link, Movie,
    Rating, Table, TableReader, TableRow, Tag,
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::{load_settings, ConfigArgs, RunSettings};
use progress::ProgressReporter;

#[derive(Parser)]
#[command(name = "lensprep")]
#[command(version, about = "Deterministic MovieLens subsetting for SQL import", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output statistics in JSON format
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the four tables and write the *_filtered outputs
    Run {
        #[command(flatten)]
        config: ConfigArgs,

        /// Show statistics without writing output
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective configuration after all layers are merged
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Count rows in each raw table
    Count {
        /// Directory containing the MovieLens tables
        #[arg(value_name = "DIR", default_value = ".")]
        data_dir: PathBuf,
    },

    /// Print the first parsed rows of one table
    Inspect {
        /// Table to read: ratings, movies, tags or links
        #[arg(value_name = "TABLE")]
        table: Table,

        /// Table file (defaults to <data-dir>/<table>.csv)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Directory containing the MovieLens tables
        #[arg(short, long, default_value = ".")]
        data_dir: PathBuf,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_ansi(!cli.json) // Disable colors if JSON output
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run { config, dry_run } => {
            run_pipeline(&config, dry_run, cli.json)?;
        }
        Commands::Config { config } => {
            show_config(&config, cli.json)?;
        }
        Commands::Count { data_dir } => {
            count_tables(&data_dir, cli.json)?;
        }
        Commands::Inspect {
            table,
            file,
            data_dir,
            limit,
        } => {
            let path = file.unwrap_or_else(|| data_dir.join(format!("{}.csv", table.stem())));
            inspect_table(table, &path, limit)?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

fn run_pipeline(args: &ConfigArgs, dry_run: bool, json_output: bool) -> Result<()> {
    let settings = load_settings(args)?;
    let filter = &settings.filter;

    info!("Starting MovieLens filtering");
    info!("  Ratings: {:?}", settings.inputs.ratings);
    info!("  Movies:  {:?}", settings.inputs.movies);
    info!("  Tags:    {:?}", settings.inputs.tags);
    info!("  Links:   {:?}", settings.inputs.links);
    info!(
        "  Limits: users={:?} movies={:?} ratings/user={:?} tags/movie={:?}",
        filter.max_users, filter.max_movies, filter.max_ratings_per_user, filter.max_tags_per_movie
    );
    if filter.ascii_only {
        info!("  ASCII only ({})", filter.ascii_strategy);
    }
    if dry_run {
        info!("  Dry run: no output will be written");
    }

    let progress = ProgressReporter::new(!json_output)?;

    let raw = load_dataset_with_progress(&settings.inputs, |table, rows| {
        progress.loading(table, rows)
    })
    .context("Failed to load input tables")?;

    progress.stage("Filtering");
    let output = Pipeline::new(filter.clone()).run(raw);

    let written = if dry_run {
        Vec::new()
    } else {
        progress.stage("Writing filtered tables");
        write_dataset(&output.dataset, &settings.outputs)
            .context("Failed to write filtered tables")?
    };

    progress.finish();
    let stats = &output.stats;

    if json_output {
        let report = serde_json::json!({
            "inputs": settings.inputs,
            "outputs": written,
            "config": filter,
            "stats": stats,
            "output_rows": stats.output_rows(),
            "retention_rate": stats.retention_rate(),
            "elapsed_secs": progress.elapsed().as_secs_f64(),
            "dry_run": dry_run,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let data_dir = settings
            .inputs
            .ratings
            .parent()
            .unwrap_or_else(|| Path::new("."));
        progress::print_summary_report(data_dir, stats, &written, progress.elapsed());
    }

    Ok(())
}

fn show_config(args: &ConfigArgs, json_output: bool) -> Result<()> {
    let settings: RunSettings = load_settings(args)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        println!("Effective configuration:");
        println!("{:#?}", settings);
    }

    Ok(())
}

#[derive(Serialize)]
struct TableCount {
    table: Table,
    path: PathBuf,
    rows: Option<usize>,
}

fn count_tables(data_dir: &Path, json_output: bool) -> Result<()> {
    info!("Counting rows in: {:?}", data_dir);

    let mut counts = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        let path = data_dir.join(format!("{}.csv", table.stem()));
        let rows = match count_rows(table, &path) {
            Ok(rows) => Some(rows),
            Err(FormatError::MissingFile { .. }) => None,
            Err(e) => return Err(e).with_context(|| format!("Failed to count {}", table)),
        };
        counts.push(TableCount { table, path, rows });
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        for count in &counts {
            match count.rows {
                Some(rows) => println!(
                    "{:<8} {:>12}  {}",
                    count.table,
                    progress::format_with_commas(rows),
                    count.path.display()
                ),
                None => println!("{:<8} {:>12}  {}", count.table, "missing", count.path.display()),
            }
        }
    }

    Ok(())
}

fn inspect_table(table: Table, path: &Path, limit: usize) -> Result<()> {
    info!("Inspecting {} table: {:?}", table, path);

    match table {
        Table::Ratings => print_rows::<Rating>(path, limit),
        Table::Movies => print_rows::<Movie>(path, limit),
        Table::Tags => print_rows::<Tag>(path, limit),
        Table::Links => print_rows::<Link>(path, limit),
    }
}

fn print_rows<T: TableRow + Serialize>(path: &Path, limit: usize) -> Result<()> {
    let mut reader = TableReader::<File, T>::open(path)?;

    for result in reader.by_ref().take(limit) {
        let row = result?;
        println!("{}", serde_json::to_string(&row)?);
    }

    info!(
        "Processed {} rows ({} bytes)",
        reader.rows_processed(),
        reader.bytes_processed()
    );

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
}
