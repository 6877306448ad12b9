//! Income business logic - money arriving at a fund. No transfer semantics.

use crate::{
    core::balance,
    entities::{Fund, Income, income},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Parameters for creating an income.
#[derive(Debug, Clone)]
pub struct NewIncome {
    /// Fund the money arrives at
    pub fund_id: i64,
    /// Amount credited to the fund
    pub amount: f64,
    /// Human-readable description
    pub description: String,
    /// Date the income occurred
    pub date: Date,
}

/// Creates an income and refreshes the receiving fund's balance.
pub async fn create_income(db: &DatabaseConnection, new: NewIncome) -> Result<income::Model> {
    if !new.amount.is_finite() || new.amount <= 0.0 {
        return Err(Error::InvalidAmount { amount: new.amount });
    }

    Fund::find_by_id(new.fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound {
            fund_id: new.fund_id,
        })?;

    let model = income::ActiveModel {
        fund_id: Set(new.fund_id),
        amount: Set(new.amount),
        description: Set(new.description),
        date: Set(new.date),
        ..Default::default()
    };
    let result = model.insert(db).await?;

    balance::recalculate_balance(db, result.fund_id).await?;

    info!(
        income_id = result.id,
        fund_id = result.fund_id,
        amount = result.amount,
        "Created income"
    );
    Ok(result)
}

/// Deletes an income and refreshes the fund it credited.
pub async fn delete_income(db: &DatabaseConnection, income_id: i64) -> Result<()> {
    let existing = Income::find_by_id(income_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Validation {
            message: format!("Income {income_id} not found"),
        })?;

    let fund_id = existing.fund_id;
    existing.delete(db).await?;
    balance::recalculate_balance(db, fund_id).await?;

    info!(income_id, fund_id, "Deleted income");
    Ok(())
}

/// Retrieves all incomes for a fund, newest first.
pub async fn list_incomes_for_fund(
    db: &DatabaseConnection,
    fund_id: i64,
) -> Result<Vec<income::Model>> {
    Income::find()
        .filter(income::Column::FundId.eq(fund_id))
        .order_by_desc(income::Column::Date)
        .order_by_desc(income::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
