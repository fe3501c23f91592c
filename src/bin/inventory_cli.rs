use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use hotel_inventory_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    handlers::AppServices,
    services::{
        channel_manager::ChannelManagerClient, comparison::SnapshotComparison,
        snapshots::SnapshotSummary, weekly_statistics::WeeklyStatsFilter,
        weekly_update::WeeklyUpdateReport,
    },
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    let result = match cli.command {
        Commands::Migrate => handle_migrate(&context).await,
        Commands::Fetch(args) => handle_fetch(&context, args, cli.json).await,
        Commands::FetchAll(args) => handle_fetch_all(&context, args, cli.json).await,
        Commands::Stats(command) => handle_stats_command(&context, command, cli.json).await,
        Commands::Snapshot(command) => handle_snapshot_command(&context, command, cli.json).await,
        Commands::Compare(args) => handle_compare(&context, args, cli.json).await,
        Commands::WeeklyUpdate(args) => handle_weekly_update(&context, args, cli.json).await,
    };

    db::close_pool(context.db.as_ref().clone())
        .await
        .context("failed to close database pool")?;
    result
}

#[derive(Parser)]
#[command(
    name = "inventory-cli",
    about = "Operator CLI for hotel inventory ingestion, statistics and snapshots",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Fetch one room type from the channel manager
    Fetch(FetchArgs),
    /// Fetch every room type, continuing past failures
    FetchAll(FetchAllArgs),
    #[command(subcommand)]
    Stats(StatsCommands),
    #[command(subcommand)]
    Snapshot(SnapshotCommands),
    /// Compare the snapshots of two dates
    Compare(CompareArgs),
    /// Run the weekly update synchronously
    WeeklyUpdate(WeeklyUpdateArgs),
}

#[derive(Args)]
struct FetchArgs {
    #[arg(long, help = "Room type code")]
    code: String,
    #[arg(long, help = "Hotel id")]
    hotel: String,
    #[arg(long, help = "First day, YYYY-MM-DD")]
    start: NaiveDate,
    #[arg(long, help = "Last day, YYYY-MM-DD")]
    end: NaiveDate,
}

#[derive(Args)]
struct FetchAllArgs {
    #[arg(long, help = "First day, YYYY-MM-DD")]
    start: NaiveDate,
    #[arg(long, help = "Last day, YYYY-MM-DD")]
    end: NaiveDate,
    #[arg(long, help = "Restrict to one hotel")]
    hotel: Option<String>,
}

#[derive(Subcommand)]
enum StatsCommands {
    /// Recompute one room type's week
    Calculate(CalculateArgs),
    /// List stored weekly statistics
    List(StatsListArgs),
}

#[derive(Args)]
struct CalculateArgs {
    #[arg(long)]
    code: String,
    #[arg(long)]
    hotel: String,
    #[arg(long, help = "Monday of the week, YYYY-MM-DD")]
    week_start: NaiveDate,
}

#[derive(Args)]
struct StatsListArgs {
    #[arg(long)]
    code: Option<String>,
    #[arg(long)]
    hotel: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=52))]
    weeks: Option<u64>,
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// Snapshot current inventory and statistics
    Create(SnapshotCreateArgs),
    /// List recent snapshots
    List(SnapshotListArgs),
    /// Delete a snapshot and its rows
    Delete(SnapshotDeleteArgs),
}

#[derive(Args)]
struct SnapshotCreateArgs {
    #[arg(long)]
    description: Option<String>,
    #[arg(long, help = "Snapshot date, defaults to today")]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct SnapshotListArgs {
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=100))]
    limit: u64,
}

#[derive(Args)]
struct SnapshotDeleteArgs {
    #[arg(long)]
    id: i32,
}

#[derive(Args)]
struct CompareArgs {
    #[arg(long, help = "Date of the older snapshot")]
    from: NaiveDate,
    #[arg(long, help = "Date of the newer snapshot")]
    to: NaiveDate,
}

#[derive(Args)]
struct WeeklyUpdateArgs {
    #[arg(long, help = "Restrict to one hotel")]
    hotel: Option<String>,
    #[arg(long, help = "Run as if today were this date")]
    today: Option<NaiveDate>,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
    services: AppServices,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        let db = Arc::new(db_pool);

        let source = Arc::new(
            ChannelManagerClient::new(config.channel_manager.clone())
                .context("failed to build channel manager client")?,
        );
        let services = AppServices::new(db.clone(), &config, source);
        debug!(target: "inventory_cli", environment = %config.environment, "CLI context ready");

        Ok(Self {
            config,
            db,
            services,
        })
    }
}

async fn handle_migrate(context: &CliContext) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied to {}", context.config.database_url());
    Ok(())
}

async fn handle_fetch(context: &CliContext, args: FetchArgs, json: bool) -> Result<()> {
    let outcome = context
        .services
        .fetcher
        .fetch_room_type(&args.code, &args.hotel, args.start, args.end)
        .await
        .with_context(|| format!("failed to fetch {} for hotel {}", args.code, args.hotel))?;

    if json {
        print_json(&outcome)?;
    } else {
        println!(
            "{} ({}) • {} days stored • {}",
            outcome.inv_type_code, outcome.hotel_id, outcome.records_stored, outcome.message
        );
    }
    Ok(())
}

async fn handle_fetch_all(context: &CliContext, args: FetchAllArgs, json: bool) -> Result<()> {
    let outcomes = context
        .services
        .fetcher
        .fetch_all(args.start, args.end, args.hotel.as_deref())
        .await
        .context("failed to fetch inventory")?;

    if json {
        return print_json(&outcomes);
    }
    for outcome in &outcomes {
        let marker = if outcome.success { "ok" } else { "FAILED" };
        println!(
            "- [{}] {} ({}) • {} days • {}",
            marker, outcome.inv_type_code, outcome.hotel_id, outcome.records_stored, outcome.message
        );
    }
    let failed = outcomes.iter().filter(|o| !o.success).count();
    println!("{} room types, {} failed", outcomes.len(), failed);
    Ok(())
}

async fn handle_stats_command(
    context: &CliContext,
    command: StatsCommands,
    json: bool,
) -> Result<()> {
    match command {
        StatsCommands::Calculate(args) => {
            let stats = context
                .services
                .statistics
                .calculate(&args.code, &args.hotel, args.week_start)
                .await
                .context("failed to calculate weekly statistics")?;
            if json {
                print_json(&stats)?;
            } else {
                println!(
                    "{} ({}) week of {}: actual {:.2}% occupied, total {:.2}% occupied, {} open days",
                    stats.inv_type_code,
                    stats.hotel_name,
                    stats.week_start_date,
                    stats.actual_occupancy_rate,
                    stats.total_occupancy_rate,
                    stats.total_available_days
                );
            }
        }
        StatsCommands::List(args) => {
            let filter = WeeklyStatsFilter::from_params(args.code, args.hotel, args.weeks);
            let rows = context
                .services
                .statistics
                .list(&filter)
                .await
                .context("failed to list weekly statistics")?;
            if json {
                print_json(&rows)?;
            } else {
                for row in &rows {
                    println!(
                        "- {} • {} ({}) • actual {:.2}% • total {:.2}%",
                        row.week_start_date,
                        row.inv_type_code,
                        row.hotel_name,
                        row.actual_occupancy_rate,
                        row.total_occupancy_rate
                    );
                }
            }
        }
    }
    Ok(())
}

async fn handle_snapshot_command(
    context: &CliContext,
    command: SnapshotCommands,
    json: bool,
) -> Result<()> {
    let snapshots = &context.services.snapshots;
    match command {
        SnapshotCommands::Create(args) => {
            let date = args.date.unwrap_or_else(|| Local::now().date_naive());
            let created = snapshots
                .create_snapshot_for_date(date, args.description)
                .await
                .context("failed to create snapshot")?;
            if json {
                print_json(&created)?;
            } else if created.created {
                println!("Snapshot {} created for {}", created.snapshot_id, date);
            } else {
                println!("Snapshot {} already exists for {}", created.snapshot_id, date);
            }
        }
        SnapshotCommands::List(args) => {
            let list = snapshots
                .list(args.limit)
                .await
                .context("failed to list snapshots")?;
            if json {
                print_json(&list)?;
            } else {
                list.iter().for_each(render_snapshot);
            }
        }
        SnapshotCommands::Delete(args) => {
            let deleted = snapshots
                .delete(args.id)
                .await
                .with_context(|| format!("failed to delete snapshot {}", args.id))?;
            if json {
                print_json(&deleted)?;
            } else {
                println!(
                    "Snapshot {} deleted ({} inventory rows, {} statistics rows)",
                    deleted.snapshot_id, deleted.inventory_rows, deleted.statistics_rows
                );
            }
        }
    }
    Ok(())
}

async fn handle_compare(context: &CliContext, args: CompareArgs, json: bool) -> Result<()> {
    let comparison = context
        .services
        .comparison
        .compare_snapshots(args.from, args.to)
        .await
        .with_context(|| format!("failed to compare {} with {}", args.from, args.to))?;

    if json {
        print_json(&comparison)
    } else {
        render_comparison(&comparison);
        Ok(())
    }
}

async fn handle_weekly_update(
    context: &CliContext,
    args: WeeklyUpdateArgs,
    json: bool,
) -> Result<()> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let report = context
        .services
        .orchestrator
        .run(today, args.hotel.as_deref())
        .await
        .context("weekly update failed")?;

    if json {
        print_json(&report)
    } else {
        render_report(&report);
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_snapshot(snapshot: &SnapshotSummary) {
    println!(
        "- Snapshot {} • {} • {} • {} records • {} room types in {} hotels",
        snapshot.id,
        snapshot.snapshot_date,
        snapshot.status,
        snapshot.total_records,
        snapshot.room_types_count,
        snapshot.hotels_count
    );
}

fn render_comparison(comparison: &SnapshotComparison) {
    let summary = &comparison.summary;
    println!(
        "{} → {}: {} changes ({} modified, {} new, {} removed)",
        comparison.period.from,
        comparison.period.to,
        summary.total_changes,
        summary.modified_records,
        summary.new_records,
        summary.removed_records
    );
    for change in &comparison.changes {
        let diff = change
            .occupancy_diff
            .map(|d| format!("{:+.2}", d))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "- [{}] {} ({}) week of {} • {}",
            change.change_type, change.inv_type_code, change.hotel_name, change.week_start_date, diff
        );
    }
}

fn render_report(report: &WeeklyUpdateReport) {
    match (report.pre_update_snapshot_id, &report.snapshot_error) {
        (Some(id), _) => println!("Pre-update snapshot: {}", id),
        (None, Some(err)) => println!("Pre-update snapshot failed: {}", err),
        (None, None) => println!("Pre-update snapshot skipped"),
    }
    println!(
        "Fetched {} → {}: {} succeeded, {} failed",
        report.fetch_start, report.fetch_end, report.fetch_succeeded, report.fetch_failed
    );
    println!(
        "Statistics over {} weeks × {} room types: {} calculated, {} failed",
        report.weeks_processed,
        report.room_types_with_data,
        report.statistics_calculated,
        report.statistics_failed
    );
}
