//! CLI administration tool for lndr-sync.
//!
//! Runs syncs and manages reservations directly against the database,
//! without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Show what a sync would change, then apply it
//! cargo run --bin admin -- sync --dry-run
//! cargo run --bin admin -- sync
//!
//! # List the /lndr/ namespace
//! cargo run --bin admin -- alias list
//!
//! # Reserve an alias for a page that has not synced yet
//! cargo run --bin admin -- alias reserve /spring-campaign
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; see `lndr_sync::config`.

use lndr_sync::config::{self, Config};
use lndr_sync::domain::entities::{Mutation, ReconcilePlan};
use lndr_sync::server::{build_state, connect_pool};
use lndr_sync::state::AppState;
use lndr_sync::application::services::{SyncReport, SyncTrigger};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};

/// CLI tool for managing lndr-sync.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Sync the alias table with the remote catalog
    Sync {
        /// Only show the planned changes
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Inspect and reserve aliases
    Alias {
        #[command(subcommand)]
        action: AliasAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Alias subcommands.
#[derive(Subcommand)]
enum AliasAction {
    /// List all aliases in the /lndr/ namespace
    List,

    /// Reserve an alias with a placeholder record
    Reserve {
        /// Alias path, e.g. /spring-campaign
        alias: Option<String>,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection and migrations
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    let pool = connect_pool(&config).await?;

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &pool).await?,
        Commands::Sync { dry_run, yes } => {
            let state = build_state(&config, pool)?;
            handle_sync(&state, &config, dry_run, yes).await?;
        }
        Commands::Alias { action } => {
            let state = build_state(&config, pool)?;
            handle_alias_action(action, &state).await?;
        }
    }

    Ok(())
}

/// Plans a sync, shows it, and applies it after confirmation.
///
/// The applied run fetches the catalog again, so it may differ from the
/// plan shown if the catalog changed in between.
async fn handle_sync(state: &AppState, config: &Config, dry_run: bool, yes: bool) -> Result<()> {
    println!("{}", "🔄 Sync".bright_blue().bold());
    println!("  Owned domain: {}", config.base_url.cyan());
    println!();

    let plan = state
        .sync_service
        .plan()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to compute plan: {}", e))?;

    print_plan(&plan);

    if dry_run {
        println!("{}", "Dry run, nothing applied".yellow());
        return Ok(());
    }

    if plan.is_empty() {
        println!("{}", "✅ Already in sync".green().bold());
        return Ok(());
    }

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Apply {} changes?", plan.mutations.len()))
            .default(plan.delete_count() == 0)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let report = state
        .sync_service
        .run(SyncTrigger::Cli, None)
        .await
        .map_err(|e| anyhow::anyhow!("Sync failed: {}", e))?;

    print_report(&report);

    if !report.success {
        anyhow::bail!("{} mutations failed", report.errors.len());
    }

    Ok(())
}

fn print_plan(plan: &ReconcilePlan) {
    if plan.mutations.is_empty() {
        println!("  {}", "No changes".bright_black());
    }

    for mutation in &plan.mutations {
        let line = mutation.to_string();
        let line = match mutation {
            Mutation::Delete { .. } => line.red(),
            Mutation::Save { .. } => line.green(),
        };
        println!("  {}", line);
    }

    for skipped in &plan.skipped {
        println!(
            "  {} catalog entry #{} ({}): {}",
            "skip".yellow(),
            skipped.index,
            skipped.id.as_deref().unwrap_or("no id"),
            skipped.reason
        );
    }

    for conflict in &plan.conflicts {
        println!("  {} {}", "conflict".bright_red().bold(), conflict);
    }

    for stale in &plan.stale {
        println!("  {} {}", "stale".yellow().bold(), stale);
    }

    println!();
    println!(
        "  Saves: {}  Deletes: {}  Skipped: {}  Conflicts: {}  Stale: {}",
        plan.save_count().to_string().bright_green().bold(),
        plan.delete_count().to_string().bright_red().bold(),
        plan.skipped.len().to_string().yellow(),
        plan.conflicts.len().to_string().bright_red(),
        plan.stale.len().to_string().yellow()
    );
    println!();
}

fn print_report(report: &SyncReport) {
    println!();
    if report.success {
        println!("{}", "✅ Sync completed".green().bold());
    } else {
        println!("{}", "⚠️  Sync completed with errors".yellow().bold());
    }
    println!(
        "  Applied: {}",
        report.applied_count.to_string().bright_green().bold()
    );
    for error in &report.errors {
        println!("  {} {}", "error".red(), error);
    }
    println!();
}

/// Dispatches alias commands.
async fn handle_alias_action(action: AliasAction, state: &AppState) -> Result<()> {
    match action {
        AliasAction::List => list_aliases(state).await,
        AliasAction::Reserve { alias } => reserve_alias(state, alias).await,
    }
}

/// Lists the namespace.
///
/// # Output Format
///
/// ```text
/// 📋 Aliases
///
///   PID    Alias                          Source
///   ────────────────────────────────────────────────────────────
///   12     /spring-campaign               /lndr/42
///   13     /coming-soon                   /lndr/reserved   RESERVED
/// ```
async fn list_aliases(state: &AppState) -> Result<()> {
    println!("{}", "📋 Aliases".bright_blue().bold());
    println!();

    let records = state
        .alias_service
        .list_namespace()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list aliases: {}", e))?;

    if records.is_empty() {
        println!("{}", "  No aliases found".yellow());
        return Ok(());
    }

    println!(
        "  {:<6} {:<30} {:<20}",
        "PID".bright_white().bold(),
        "Alias".bright_white().bold(),
        "Source".bright_white().bold()
    );
    println!("  {}", "─".repeat(60).bright_black());

    for (record, source) in &records {
        let marker = if source.is_reserved() {
            "RESERVED".yellow()
        } else {
            "".normal()
        };

        println!(
            "  {:<6} {:<30} {:<20} {}",
            record.pid.to_string().bright_black(),
            record.alias.cyan(),
            record.source,
            marker
        );
    }

    println!();
    println!(
        "  Total: {}",
        records.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Reserves an alias, prompting for it when not given.
async fn reserve_alias(state: &AppState, alias: Option<String>) -> Result<()> {
    println!("{}", "📌 Reserve Alias".bright_blue().bold());
    println!();

    let alias = match alias {
        Some(a) => a,
        None => Input::new()
            .with_prompt("Alias")
            .with_initial_text("/")
            .interact_text()?,
    };

    let record = state
        .alias_service
        .reserve(&alias)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to reserve alias: {}", e))?;

    println!(
        "{} {} (pid {})",
        "✅ Reserved".green().bold(),
        record.alias.cyan(),
        record.pid
    );
    println!();
    println!(
        "  The next sync that sees a page published at {} will take it over.",
        record.alias.cyan()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &sqlx::PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;
            println!("{}", "✅ Database connection OK".green().bold());

            let table: Option<String> =
                sqlx::query_scalar("SELECT to_regclass('public.url_alias')::text")
                    .fetch_one(pool)
                    .await?;

            match table {
                Some(_) => {
                    let count: i64 = sqlx::query_scalar(
                        "SELECT COUNT(*) FROM url_alias WHERE source LIKE '/lndr/%'",
                    )
                    .fetch_one(pool)
                    .await?;
                    println!(
                        "  url_alias present, {} namespace records",
                        count.to_string().bright_white().bold()
                    );
                }
                None => println!(
                    "{}",
                    "⚠️  url_alias table missing, start the server once to run migrations"
                        .yellow()
                ),
            }
        }
    }

    Ok(())
}
