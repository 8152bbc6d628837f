//! `sd_cli` - CLI commands for Shop Desk
//!
//! This crate provides:
//! - clap-based command definitions
//! - Schema initialization, ingestion, and reset commands
//! - The per-table report renderer (text and JSON output)

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use sd_config::ShopConfig;
use sd_ingest::Ingestor;
use sd_store::ShopStore;

/// CLI errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Config error: {0}")]
    ConfigError(#[from] sd_config::ConfigError),

    #[error("Store error: {0}")]
    StoreError(#[from] sd_store::StoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Output format for commands
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Standard JSON output
    Json,
}

/// Report tables, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TableName {
    Customers,
    Mechanics,
    Vehicles,
    Bays,
    Services,
    Schedule,
}

/// All tables in the order the report renders them.
const REPORT_ORDER: [TableName; 6] = [
    TableName::Customers,
    TableName::Mechanics,
    TableName::Vehicles,
    TableName::Bays,
    TableName::Services,
    TableName::Schedule,
];

/// Main CLI application
#[derive(Parser, Debug)]
#[command(name = "shopdesk")]
#[command(author, version, about = "Shop Desk - auto-shop scheduling records")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for commands
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the schema and seed rows if not already present
    Init,

    /// Ingest an operational record file
    Ingest {
        /// Input file, one record per line
        file: PathBuf,
    },

    /// Display table contents
    Report {
        /// Limit the report to a single table
        #[arg(short, long)]
        table: Option<TableName>,
    },

    /// Drop and rebuild the schema (destroys all data)
    Reset,
}

impl Cli {
    /// Run the CLI
    ///
    /// # Errors
    ///
    /// Returns [`CliError`] on config, storage, or file access failures.
    /// Schema creation failures are fatal; per-record ingestion failures are
    /// absorbed into the printed summary.
    pub fn run(self) -> Result<(), CliError> {
        let store = open_store(self.config.as_ref())?;

        match self.command {
            Commands::Init => {
                if store.ensure_schema()? {
                    println!("Schema created and seeded at {}", store.db_path());
                } else {
                    println!("Schema already present at {}", store.db_path());
                }
            }
            Commands::Ingest { file } => {
                store.ensure_schema()?;
                info!(file = %file.display(), "Reading input file");
                let contents = std::fs::read_to_string(&file)?;
                let summary = Ingestor::new(&store).ingest(&contents);
                match self.format {
                    OutputFormat::Json => print_json(&summary),
                    OutputFormat::Text => {
                        println!("Ingested {}:", file.display());
                        println!("  customers inserted: {}", summary.customers_inserted);
                        println!("  vehicles inserted:  {}", summary.vehicles_inserted);
                        println!("  vehicles skipped:   {}", summary.vehicles_skipped);
                        println!("  services seen:      {}", summary.services_seen);
                        println!("  lines ignored:      {}", summary.lines_ignored);
                        if summary.insert_failures > 0 {
                            println!("  insert failures:    {}", summary.insert_failures);
                        }
                    }
                }
            }
            Commands::Report { table } => {
                store.ensure_schema()?;
                let tables: Vec<TableName> = match table {
                    Some(t) => vec![t],
                    None => REPORT_ORDER.to_vec(),
                };
                for t in tables {
                    report_table(&store, t, self.format)?;
                }
            }
            Commands::Reset => {
                store.teardown_schema()?;
                store.ensure_schema()?;
                println!("Schema reset at {}", store.db_path());
            }
        }

        Ok(())
    }
}

fn open_store(config_path: Option<&PathBuf>) -> Result<ShopStore, CliError> {
    let config = match config_path {
        Some(path) => ShopConfig::load_with_env(path)?,
        None => ShopConfig::discover_with_env()?,
    };
    Ok(ShopStore::open(&config.global.db_path)?)
}

/// Render one table of the report.
fn report_table(store: &ShopStore, table: TableName, format: OutputFormat) -> Result<(), CliError> {
    match table {
        TableName::Customers => {
            let rows = store.list_customers()?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    println!("\nCustomers:");
                    for row in rows {
                        println!("id: {} -- name: {}", row.id, row.name);
                    }
                }
            }
        }
        TableName::Mechanics => {
            let rows = store.list_mechanics()?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    println!("\nMechanics:");
                    for row in rows {
                        println!(
                            "id: {} -- name: {} -- rate: ${:.2}",
                            row.id, row.name, row.hourly_rate
                        );
                    }
                }
            }
        }
        TableName::Vehicles => {
            let rows = store.list_vehicles()?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    println!("\nVehicles:");
                    for row in rows {
                        println!(
                            "id: {} -- customer id: {} -- description: {}",
                            row.id, row.customer_id, row.description
                        );
                    }
                }
            }
        }
        TableName::Bays => {
            let rows = store.list_bays()?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    println!("\nBays:");
                    for row in rows {
                        let mechanic = row
                            .mechanic_id
                            .map_or_else(|| "unassigned".to_string(), |id| id.to_string());
                        println!("id: {} -- mechanic id: {}", row.id, mechanic);
                    }
                }
            }
        }
        TableName::Services => {
            let rows = store.list_services()?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    println!("\nServices:");
                    for row in rows {
                        println!(
                            "id: {} -- service: {} -- time: {} min",
                            row.id, row.name, row.duration_minutes
                        );
                    }
                }
            }
        }
        TableName::Schedule => {
            let rows = store.list_appointments()?;
            match format {
                OutputFormat::Json => print_json(&rows),
                OutputFormat::Text => {
                    println!("\nSchedule:");
                    for row in rows {
                        let time = row.appointment_time.as_deref().unwrap_or("-");
                        println!(
                            "id: {} -- vehicle id: {} -- service id: {} -- bay id: {} -- time: {}",
                            row.id, row.vehicle_id, row.service_id, row.bay_id, time
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "serialization failed: {e}"}}"#));
    println!("{json}");
}
