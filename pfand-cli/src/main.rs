use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pfand_cli::app;
use pfand_cli::config::AppConfig;
use pfand_cli::logging::init_logging;
use pfand_core::DependentCount;
use pfand_data::loader::parse_amount;
use rust_decimal::Decimal;
use tracing::{debug, info};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Garnishment table calculator (§ 850c ZPO).
///
/// Generates the table of garnishable amounts from a handful of anchor
/// values, stores it in the configured database and answers lookups.
#[derive(Debug, Parser)]
#[command(name = "pfaendungsrechner", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, default_value = "pfand.toml")]
    config: PathBuf,

    /// Database backend; overrides `[database] backend`.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string; overrides `[database] connection_string`.
    /// For SQLite this is a file path (e.g. `pfand.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up the garnishable amount for a net income.
    Lookup {
        /// Monthly net income in EUR; `2150,50` and `2150.50` are both accepted.
        #[arg(long, value_parser = parse_income, allow_negative_numbers = true)]
        income: Decimal,

        /// Number of dependents; values above 5 count as 5.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        dependents: i64,
    },

    /// Print the generated table as CSV without touching the database.
    Table {
        /// Anchor CSV (`key,value`); statutory defaults when omitted.
        #[arg(long)]
        anchors: Option<PathBuf>,
    },

    /// Regenerate the stored table.
    Refresh {
        /// Anchor CSV (`key,value`); statutory defaults when omitted.
        #[arg(long)]
        anchors: Option<PathBuf>,
    },
}

fn parse_income(s: &str) -> Result<Decimal, String> {
    parse_amount(s).ok_or_else(|| format!("'{s}' is not an amount"))
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(Some(&cli.config))
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?
        .with_overrides(cli.backend, cli.db);
    init_logging(&config.logging)?;
    let schedule = config.schedule.to_schedule();

    match cli.command {
        Command::Table { anchors } => {
            let raw = app::load_anchors(anchors.as_deref())?;
            let table = app::generate_table(&raw, &schedule)?;
            debug!(rows = table.rows().len(), "writing table");
            app::write_table_csv(io::stdout().lock(), table.rows())?;
        }
        Command::Refresh { anchors } => {
            let raw = app::load_anchors(anchors.as_deref())?;
            debug!("connecting to {} backend", config.database.backend);
            let repo = app::build_registry().create(&config.database).await?;

            let refresh = app::refresh(&*repo, &raw, &schedule).await?;
            info!(id = refresh.id, rows = refresh.row_count, "refresh stored");
            println!(
                "Stored {} rows from {} to {} EUR.",
                refresh.row_count, refresh.start_income, refresh.end_income
            );
        }
        Command::Lookup { income, dependents } => {
            let dependents = DependentCount::clamped(dependents);
            debug!("connecting to {} backend", config.database.backend);
            let repo = app::build_registry().create(&config.database).await?;

            let outcome = app::lookup(&*repo, &schedule, income, dependents).await?;
            println!("{}", app::describe_outcome(income, dependents, outcome));
        }
    }

    Ok(())
}
