//! Source-fund backfill - assigns `source_fund_id` to historical expenses
//! that predate fund tracking.
//!
//! The backfill is idempotent and restartable: only rows where
//! `source_fund_id IS NULL` are considered, each row's default fund comes
//! from the resolver's precedence (earliest relationship, then the legacy
//! pointer), and rows whose category resolves to no fund are reported as
//! orphaned rather than written or aborted on. Batching is cursor-based on
//! the expense id, so permanently orphaned rows never stall progress and a
//! caller can impose its own pacing or cancellation between batches.

use crate::{
    core::resolver,
    entities::{Expense, expense},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Read-only snapshot of how far the backfill has progressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// All expense rows
    pub total_expenses: u64,
    /// Rows that already carry a source fund
    pub expenses_with_source_fund: u64,
    /// Rows still lacking a source fund
    pub expenses_without_source_fund: u64,
    /// True when nothing is left to migrate
    pub migration_complete: bool,
}

/// An expense the backfill could not assign a source fund to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrphanedExpense {
    /// The unmigratable expense
    pub expense_id: i64,
    /// Its category, which resolves to no fund
    pub category_id: i64,
}

/// Outcome of one backfill batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Rows examined in this batch
    pub examined: u64,
    /// Rows assigned a source fund
    pub migrated: u64,
    /// Rows that could not be migrated
    pub orphaned: Vec<OrphanedExpense>,
    /// Cursor to pass to the next batch; `None` when the scan is done
    pub next_cursor: Option<i64>,
}

/// Outcome of a full backfill run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    /// Rows examined across all batches
    pub examined: u64,
    /// Rows assigned a source fund
    pub migrated: u64,
    /// Rows that could not be migrated, reported rather than swallowed
    pub orphaned: Vec<OrphanedExpense>,
    /// Number of batches processed
    pub batches: u64,
}

/// Reports backfill progress as a pure read, usable before and after the
/// backfill for operational dashboards and automated verification.
pub async fn check_migration_status<C>(db: &C) -> Result<MigrationStatus>
where
    C: ConnectionTrait,
{
    let total_expenses = Expense::find().count(db).await?;
    let expenses_without_source_fund = Expense::find()
        .filter(expense::Column::SourceFundId.is_null())
        .count(db)
        .await?;
    let expenses_with_source_fund = total_expenses - expenses_without_source_fund;

    Ok(MigrationStatus {
        total_expenses,
        expenses_with_source_fund,
        expenses_without_source_fund,
        migration_complete: expenses_without_source_fund == 0,
    })
}

/// Processes one batch of un-migrated expenses starting after `cursor`.
///
/// `defaults` memoizes per-category resolution for the duration of a run so
/// repeated categories cost one lookup. Every row is handled completely
/// within its batch; a batch boundary never splits a row's work.
pub async fn backfill_batch(
    db: &DatabaseConnection,
    cursor: Option<i64>,
    batch_size: u64,
    defaults: &mut HashMap<i64, Option<i64>>,
) -> Result<BatchReport> {
    let mut query = Expense::find()
        .filter(expense::Column::SourceFundId.is_null())
        .order_by_asc(expense::Column::Id)
        .limit(batch_size);
    if let Some(last_id) = cursor {
        query = query.filter(expense::Column::Id.gt(last_id));
    }
    let batch = query.all(db).await?;

    let mut report = BatchReport {
        examined: 0,
        migrated: 0,
        orphaned: Vec::new(),
        next_cursor: None,
    };

    for row in batch {
        report.examined += 1;
        report.next_cursor = Some(row.id);

        let category_id = row.category_id;
        let default_fund = match defaults.get(&category_id) {
            Some(cached) => *cached,
            None => {
                let resolved = match resolver::resolve_default_fund_for_category(db, category_id)
                    .await
                {
                    Ok(fund_id) => fund_id,
                    // A dangling category makes the row orphaned, not the run failed
                    Err(Error::CategoryNotFound { .. }) => None,
                    Err(other) => return Err(other),
                };
                defaults.insert(category_id, resolved);
                resolved
            }
        };

        match default_fund {
            Some(fund_id) => {
                let expense_id = row.id;
                let mut active: expense::ActiveModel = row.into();
                active.source_fund_id = Set(Some(fund_id));
                active.update(db).await?;
                report.migrated += 1;
                info!(expense_id, fund_id, "Backfilled expense source fund");
            }
            None => {
                warn!(
                    expense_id = row.id,
                    category_id, "Expense category resolves to no fund; leaving unmigrated"
                );
                report.orphaned.push(OrphanedExpense {
                    expense_id: row.id,
                    category_id,
                });
            }
        }
    }

    Ok(report)
}

/// Runs the backfill to completion in batches of `batch_size`.
///
/// Safe to re-run: already-migrated rows are filtered out by the
/// `source_fund_id IS NULL` predicate and never touched again.
pub async fn backfill_source_funds(
    db: &DatabaseConnection,
    batch_size: u64,
) -> Result<MigrationReport> {
    let mut report = MigrationReport {
        examined: 0,
        migrated: 0,
        orphaned: Vec::new(),
        batches: 0,
    };
    let mut defaults: HashMap<i64, Option<i64>> = HashMap::new();
    let mut cursor = None;

    loop {
        let batch = backfill_batch(db, cursor, batch_size, &mut defaults).await?;
        if batch.examined == 0 {
            break;
        }
        report.examined += batch.examined;
        report.migrated += batch.migrated;
        report.orphaned.extend(batch.orphaned);
        report.batches += 1;
        cursor = batch.next_cursor;
    }

    info!(
        examined = report.examined,
        migrated = report.migrated,
        orphaned = report.orphaned.len(),
        batches = report.batches,
        "Source fund backfill finished"
    );
    Ok(report)
}
