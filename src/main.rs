use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod age;
mod config;
mod error;
mod loader;
mod lookup;
mod models;
mod report;
mod stats;

use config::{Config, DEFAULT_CONFIG_FILE};
use models::{DerivedRecord, GroupKey};

#[derive(Parser)]
#[command(name = "brevet-results")]
#[command(about = "Lookups and pass-rate statistics over exam result files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Results file (overrides the config file)
    #[arg(long, global = true, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Config file (defaults to .brevet.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Date ages are computed against, YYYY-MM-DD
    #[arg(long, global = true, value_name = "DATE")]
    reference_date: Option<NaiveDate>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one student's result by identifier
    Lookup {
        id: String,
        /// Only name, score and decision
        #[arg(long)]
        brief: bool,
    },
    /// Overall totals, pass rate and mean score
    Stats,
    /// Statistics grouped by region, birthplace or age
    Group {
        #[arg(long)]
        by: GroupKey,
    },
    /// Write chart data files
    Charts {
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        #[arg(long)]
        top: Option<usize>,
    },
    /// Write a default .brevet.toml
    InitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let command = match cli.command {
        Commands::InitConfig => return handle_init_config(),
        command => command,
    };

    let mut config = load_config(cli.config.as_deref())?;
    config.apply_overrides(cli.data.as_deref(), cli.reference_date);
    debug!("Effective config: {:?}", config);

    let delimiter = u8::try_from(config.data.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .context("delimiter must be a single ASCII character")?;
    let outcome = loader::load(
        &config.data.path,
        &config.columns,
        delimiter,
        config.data.reference_date,
    )
    .with_context(|| format!("Failed to load results from {}", config.data.path.display()))?;
    let records = outcome.records;

    match command {
        Commands::Lookup { id, brief } => {
            let id = match lookup::parse_identifier(&id) {
                Ok(id) => id,
                Err(err) => {
                    eprintln!("Invalid input: {err}");
                    std::process::exit(2);
                }
            };
            match lookup::find_by_identifier(&records, id) {
                Some(derived) if brief => {
                    let view = lookup::brief(derived);
                    emit(cli.format, &view, || report::render_brief(&view))?;
                }
                Some(derived) => match cli.format {
                    OutputFormat::Text => print!("{}", report::render_record(derived)),
                    OutputFormat::Json => print_json(&record_json(derived))?,
                },
                None => println!("No record found with identifier {id}."),
            }
        }
        Commands::Stats => {
            let summary = stats::global_stats(&records);
            emit(cli.format, &summary, || report::render_global(&summary))?;
        }
        Commands::Group { by } => {
            let groups = stats::grouped_stats(&records, by);
            info!("{} groups by {}", groups.len(), by);
            emit(cli.format, &groups, || report::render_grouped(by, &groups))?;
        }
        Commands::Charts { out, top } => {
            let out_dir = out.unwrap_or_else(|| config.charts.output_dir.clone());
            let top_n = top.unwrap_or(config.charts.top_n);
            let written = report::write_charts(&records, &out_dir, top_n)?;
            println!(
                "Wrote {} chart data files to {}.",
                written.len(),
                out_dir.display()
            );
        }
        Commands::InitConfig => {}
    }

    Ok(())
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{DEFAULT_CONFIG_FILE} already exists; remove it or edit it manually");
    }

    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("Failed to write {DEFAULT_CONFIG_FILE}"))?;
    println!("Created {DEFAULT_CONFIG_FILE} with default settings.");
    Ok(())
}

/// An explicit path must parse; a discovered default file falls back to defaults on error.
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        info!("Loading config from: {}", path.display());
        return Config::load(path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded config from {DEFAULT_CONFIG_FILE}");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", text()),
        OutputFormat::Json => print_json(value)?,
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

fn record_json(derived: &DerivedRecord) -> serde_json::Value {
    let mut fields: serde_json::Map<String, serde_json::Value> = derived
        .record
        .attributes
        .iter()
        .map(|(column, value)| (column.clone(), serde_json::Value::String(value.clone())))
        .collect();
    fields.insert("Age".to_string(), serde_json::json!(derived.age));
    serde_json::Value::Object(fields)
}
