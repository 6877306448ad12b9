//! Operational entry point for the fund ledger engine.
//!
//! Connects to the configured database, reports migration status, runs the
//! source-fund backfill, and recalculates every fund's stored balance so the
//! ledger is authoritative afterwards.

use dotenvy::dotenv;
use fund_ledger::{config, core, errors::Result};
use sea_orm::Database;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_app_configuration()?;

    // 4. Connect and make sure the schema exists
    let db = Database::connect(app_config.database_url())
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;

    // 5. Report migration status, run the backfill, report again
    let before = core::migration::check_migration_status(&db).await?;
    info!(
        total = before.total_expenses,
        without_source_fund = before.expenses_without_source_fund,
        complete = before.migration_complete,
        "Migration status before backfill"
    );

    if !before.migration_complete {
        let report =
            core::migration::backfill_source_funds(&db, app_config.migration.batch_size).await?;
        info!(
            examined = report.examined,
            migrated = report.migrated,
            batches = report.batches,
            "Backfill finished"
        );
        for orphan in &report.orphaned {
            warn!(
                expense_id = orphan.expense_id,
                category_id = orphan.category_id,
                "Expense could not be migrated: category has no resolvable fund"
            );
        }
    }

    let after = core::migration::check_migration_status(&db).await?;
    info!(
        with_source_fund = after.expenses_with_source_fund,
        without_source_fund = after.expenses_without_source_fund,
        complete = after.migration_complete,
        "Migration status after backfill"
    );

    // 6. Refresh every stored balance from transaction history
    for fund in core::fund::list_funds(&db).await? {
        let result = core::balance::recalculate_balance(&db, fund.id).await?;
        info!(
            fund_id = result.fund_id,
            old_balance = result.old_balance,
            new_balance = result.new_balance,
            "Fund balance refreshed"
        );
    }

    Ok(())
}
