#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the complaint ingestion tool.

use clap::{Args, Parser, Subcommand};
use fondue_database::db::{self, DbConfig};
use fondue_ingest::{IngestionCache, load_complaints, load_features};
use fondue_ingest_models::{CSV_PAGE_SIZE, FEATURE_PAGE_SIZE, LoadReport};
use fondue_source::client::{DEFAULT_API_URL, TraffyClient};
use fondue_source::parsing;
use fondue_source_models::{Attribution, DateRange, PageQuery};

#[derive(Parser)]
#[command(name = "fondue_ingest", about = "Traffy Fondue complaint ingestion tool")]
struct Cli {
    /// Upstream API endpoint
    #[arg(long, env = "FONDUE_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single structured page and print its counts
    Fetch {
        #[command(flatten)]
        page: PageArgs,
    },
    /// Store structured pages until the cached total is covered
    Sync {
        #[command(flatten)]
        page: PageArgs,
        /// Divisor used to plan the number of pages
        #[arg(long, env = "FONDUE_FEATURE_PAGE_SIZE", default_value_t = FEATURE_PAGE_SIZE)]
        page_size: u64,
    },
    /// Store CSV pages until the cached total is covered
    SyncCsv {
        #[command(flatten)]
        page: PageArgs,
        #[command(flatten)]
        attribution: AttributionArgs,
        /// Divisor used to plan the number of pages
        #[arg(long, env = "FONDUE_CSV_PAGE_SIZE", default_value_t = CSV_PAGE_SIZE)]
        page_size: u64,
    },
}

#[derive(Args)]
struct PageArgs {
    /// First day to include (`YYYY-MM-DD`)
    #[arg(long, default_value = "", value_parser = parse_date_bound)]
    start: String,
    /// Last day to include (`YYYY-MM-DD`)
    #[arg(long, default_value = "", value_parser = parse_date_bound)]
    end: String,
    /// Number of records to skip
    #[arg(long, default_value_t = 0)]
    offset: u64,
    /// Records requested per page
    #[arg(long, default_value_t = 0)]
    limit: u64,
}

impl PageArgs {
    fn into_query(self) -> PageQuery {
        PageQuery::new(DateRange::new(self.start, self.end), self.offset, self.limit)
    }
}

#[derive(Args)]
struct AttributionArgs {
    /// Reporter name sent with CSV requests
    #[arg(long, default_value = "")]
    name: String,
    /// Reporter organization
    #[arg(long, default_value = "")]
    org: String,
    /// Purpose of the export
    #[arg(long, default_value = "")]
    purpose: String,
    /// Contact email
    #[arg(long, default_value = "")]
    email: String,
}

impl From<AttributionArgs> for Attribution {
    fn from(args: AttributionArgs) -> Self {
        Self {
            name: args.name,
            org: args.org,
            purpose: args.purpose,
            email: args.email,
        }
    }
}

fn parse_date_bound(s: &str) -> Result<String, String> {
    if parsing::is_valid_date_bound(s) {
        Ok(s.to_string())
    } else {
        Err(format!("expected YYYY-MM-DD, got '{s}'"))
    }
}

fn log_report(label: &str, report: &LoadReport) {
    log::info!(
        "{label}: {:?} after {}/{} page(s), {} record(s) inserted, next offset {}",
        report.outcome,
        report.pages_inserted,
        report.planned_pages,
        report.records_inserted,
        report.final_offset
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let client = TraffyClient::new(cli.api_url);
    let cache = IngestionCache::default();

    match cli.command {
        Commands::Fetch { page } => {
            let batch = cache.refresh(&client, &page.into_query()).await?;
            println!(
                "status={} total={} count_total={} features={}",
                batch.status,
                batch.total,
                batch.count_total,
                batch.features.len()
            );
        }
        Commands::Sync { page, page_size } => {
            let sink = db::connect(&DbConfig::from_env()).await?;
            log::info!("Priming cache with an unbounded fetch...");
            cache.refresh(&client, &PageQuery::unbounded()).await?;

            let report =
                load_features(&client, &sink, &cache, &page.into_query(), page_size).await?;
            log_report("sync", &report);
        }
        Commands::SyncCsv {
            page,
            attribution,
            page_size,
        } => {
            let sink = db::connect(&DbConfig::from_env()).await?;
            log::info!("Priming cache with an unbounded fetch...");
            cache.refresh(&client, &PageQuery::unbounded()).await?;

            let report = load_complaints(
                &client,
                &sink,
                &cache,
                &page.into_query(),
                &attribution.into(),
                page_size,
            )
            .await?;
            log_report("sync-csv", &report);
        }
    }

    Ok(())
}
