//! Fund balance engine - recomputes authoritative fund balances from
//! transaction history.
//!
//! A fund's stored `current_balance` is only a cache of the projection
//! computed here. Whenever integrity is in question the balance is
//! recomputed from scratch: initial balance, plus all incomes, minus all
//! expenses debiting the fund (a transfer's debit is already one of those
//! expense rows, so transfer-out is never subtracted a second time), plus
//! all transfers arriving at the fund.

use crate::{
    entities::{Expense, Fund, Income, expense, fund, income},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// The computed balance projection for one fund.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundBalance {
    /// Fund the projection describes
    pub fund_id: i64,
    /// Balance the fund started with
    pub initial_balance: f64,
    /// Sum of all incomes arriving at the fund
    pub income_total: f64,
    /// Sum of all expenses debiting the fund, transfers included
    pub expense_total: f64,
    /// Sum of transfer-expense amounts arriving at the fund
    pub transfer_in_total: f64,
    /// Informational: the transfer share of `expense_total`
    pub transfer_out_total: f64,
    /// `initial_balance + income_total - expense_total + transfer_in_total`
    pub current_balance: f64,
}

/// Result of one authoritative recalculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundBalanceResult {
    /// Fund that was recalculated
    pub fund_id: i64,
    /// Stored balance before the recalculation
    pub old_balance: f64,
    /// Stored balance after the recalculation
    pub new_balance: f64,
    /// The full projection the new balance came from
    pub calculation_details: FundBalance,
}

/// Computes the balance projection for a fund without writing anything.
pub async fn compute_balance<C>(db: &C, fund_id: i64) -> Result<FundBalance>
where
    C: ConnectionTrait,
{
    let target = Fund::find_by_id(fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound { fund_id })?;

    let income_total: f64 = Income::find()
        .filter(income::Column::FundId.eq(fund_id))
        .all(db)
        .await?
        .iter()
        .map(|i| i.amount)
        .sum();

    let source_expenses = Expense::find()
        .filter(expense::Column::SourceFundId.eq(fund_id))
        .all(db)
        .await?;
    let expense_total: f64 = source_expenses.iter().map(|e| e.amount).sum();
    let transfer_out_total: f64 = source_expenses
        .iter()
        .filter(|e| e.destination_fund_id.is_some())
        .map(|e| e.amount)
        .sum();

    let transfer_in_total: f64 = Expense::find()
        .filter(expense::Column::DestinationFundId.eq(fund_id))
        .all(db)
        .await?
        .iter()
        .map(|e| e.amount)
        .sum();

    let current_balance = target.initial_balance + income_total - expense_total + transfer_in_total;
    debug!(
        fund_id,
        income_total, expense_total, transfer_in_total, current_balance,
        "Computed balance projection"
    );

    Ok(FundBalance {
        fund_id,
        initial_balance: target.initial_balance,
        income_total,
        expense_total,
        transfer_in_total,
        transfer_out_total,
        current_balance,
    })
}

/// Recomputes the fund's balance from transaction history and overwrites the
/// stored `current_balance` with the result.
///
/// Idempotent: with no intervening writes, a second call produces the same
/// balance and generates no transaction records. All-or-nothing: an unknown
/// fund is an error and nothing is written.
pub async fn recalculate_balance<C>(db: &C, fund_id: i64) -> Result<FundBalanceResult>
where
    C: ConnectionTrait,
{
    let details = compute_balance(db, fund_id).await?;

    let target = Fund::find_by_id(fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound { fund_id })?;
    let old_balance = target.current_balance;

    let mut active: fund::ActiveModel = target.into();
    active.current_balance = Set(details.current_balance);
    active.update(db).await?;

    info!(
        fund_id,
        old_balance,
        new_balance = details.current_balance,
        "Recalculated fund balance"
    );

    Ok(FundBalanceResult {
        fund_id,
        old_balance,
        new_balance: details.current_balance,
        calculation_details: details,
    })
}

/// Recalculates every fund a write referenced, once each, after the write
/// has committed. Recalculations run sequentially in the calling task; the
/// caller is responsible for not interleaving writes to the same fund.
pub async fn recalculate_touched<C>(db: &C, fund_ids: &[i64]) -> Result<Vec<FundBalanceResult>>
where
    C: ConnectionTrait,
{
    let unique: BTreeSet<i64> = fund_ids.iter().copied().collect();
    let mut results = Vec::with_capacity(unique.len());
    for fund_id in unique {
        results.push(recalculate_balance(db, fund_id).await?);
    }
    Ok(results)
}
