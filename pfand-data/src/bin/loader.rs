use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pfand_core::{GarnishmentRepository, GarnishmentSchedule, RawAnchors};
use pfand_data::{AnchorFileLoader, TableRefresher};
use pfand_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Regenerate the garnishment table from an anchor file and store it.
///
/// The anchor file is a CSV with a `key,value` header. Recognised keys:
/// - start_income / end_income: first band start and table ceiling
/// - start_income_<d>: income at which the column for d dependents starts
/// - start_amount_<d>: garnishable amount in that column's first band
///
/// Without `--anchors` the statutory defaults are used.
#[derive(Parser, Debug)]
#[command(name = "pfand-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing anchor values
    #[arg(short, long)]
    anchors: Option<PathBuf>,

    /// SQLite database URL (e.g., sqlite:pfand.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:pfand.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    let raw = match &args.anchors {
        Some(path) => {
            println!("Loading anchors from: {}", path.display());
            let file =
                File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
            AnchorFileLoader::parse(file)
                .with_context(|| format!("Failed to parse CSV: {}", path.display()))?
        }
        None => {
            println!("No anchor file given; using statutory defaults.");
            RawAnchors::default()
        }
    };

    let refresh = TableRefresher::refresh(&repo, &raw, &GarnishmentSchedule::default())
        .await
        .context("Failed to refresh garnishment table")?;

    println!(
        "Stored {} rows covering {} to {} (refresh #{}).",
        refresh.row_count, refresh.start_income, refresh.end_income, refresh.id
    );
    println!(
        "Table now holds {} rows.",
        repo.count_rows().await.context("Failed to count rows")?
    );

    Ok(())
}
