//! Expense business logic - the write path every expense goes through.
//!
//! An expense debits its source fund; a non-null destination fund makes it a
//! fund-to-fund transfer. Validation happens before persistence: the amount
//! must be positive and finite, a transfer's endpoints must differ (never
//! silently coerced to a non-transfer), and the source fund must be eligible
//! for the category per the resolver. After the write commits, every fund
//! the expense references is recalculated - never before, to avoid computing
//! against a pre-write snapshot.

use crate::{
    core::{balance, cache::RelationshipCache, resolver},
    entities::{Expense, Fund, expense},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{info, warn};

/// Parameters for creating or replacing an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    /// Category the expense is classified under
    pub category_id: i64,
    /// Fund the money leaves
    pub source_fund_id: i64,
    /// Fund the money arrives at; presence makes this a transfer
    pub destination_fund_id: Option<i64>,
    /// Amount debited from the source fund
    pub amount: f64,
    /// How the expense was paid
    pub payment_method: String,
    /// Human-readable description
    pub description: String,
    /// Date the expense occurred
    pub date: Date,
}

async fn validate_new_expense(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    new: &NewExpense,
) -> Result<Vec<String>> {
    if !new.amount.is_finite() || new.amount <= 0.0 {
        return Err(Error::InvalidAmount { amount: new.amount });
    }

    if let Some(destination_fund_id) = new.destination_fund_id {
        if destination_fund_id == new.source_fund_id {
            return Err(Error::SameFundTransfer {
                fund_id: new.source_fund_id,
            });
        }
        Fund::find_by_id(destination_fund_id)
            .one(db)
            .await?
            .ok_or(Error::FundNotFound {
                fund_id: destination_fund_id,
            })?;
    }

    let warnings = resolver::validate_expense_fund_for_category_cached(
        db,
        cache,
        new.category_id,
        new.source_fund_id,
    )
    .await?;
    for warning in &warnings {
        warn!(category_id = new.category_id, "{warning}");
    }
    Ok(warnings)
}

fn touched_funds(source: Option<i64>, destination: Option<i64>) -> Vec<i64> {
    source.into_iter().chain(destination).collect()
}

/// Creates an expense (or transfer) and refreshes the balances of every fund
/// it references. Returns the stored model together with any advisory
/// validation warnings.
pub async fn create_expense(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    new: NewExpense,
) -> Result<(expense::Model, Vec<String>)> {
    let warnings = validate_new_expense(db, cache, &new).await?;

    let model = expense::ActiveModel {
        category_id: Set(new.category_id),
        source_fund_id: Set(Some(new.source_fund_id)),
        destination_fund_id: Set(new.destination_fund_id),
        amount: Set(new.amount),
        payment_method: Set(new.payment_method),
        description: Set(new.description),
        date: Set(new.date),
        ..Default::default()
    };
    let result = model.insert(db).await?;

    balance::recalculate_touched(
        db,
        &touched_funds(result.source_fund_id, result.destination_fund_id),
    )
    .await?;

    info!(
        expense_id = result.id,
        category_id = result.category_id,
        amount = result.amount,
        is_transfer = result.destination_fund_id.is_some(),
        "Created expense"
    );
    Ok((result, warnings))
}

/// Replaces an existing expense with new values, then refreshes the balances
/// of every fund referenced before or after the update.
pub async fn update_expense(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    expense_id: i64,
    new: NewExpense,
) -> Result<(expense::Model, Vec<String>)> {
    let existing = Expense::find_by_id(expense_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Validation {
            message: format!("Expense {expense_id} not found"),
        })?;

    let warnings = validate_new_expense(db, cache, &new).await?;

    let old_funds = touched_funds(existing.source_fund_id, existing.destination_fund_id);

    let mut active: expense::ActiveModel = existing.into();
    active.category_id = Set(new.category_id);
    active.source_fund_id = Set(Some(new.source_fund_id));
    active.destination_fund_id = Set(new.destination_fund_id);
    active.amount = Set(new.amount);
    active.payment_method = Set(new.payment_method);
    active.description = Set(new.description);
    active.date = Set(new.date);
    let result = active.update(db).await?;

    let mut funds = old_funds;
    funds.extend(touched_funds(
        result.source_fund_id,
        result.destination_fund_id,
    ));
    balance::recalculate_touched(db, &funds).await?;

    info!(expense_id, "Updated expense");
    Ok((result, warnings))
}

/// Deletes an expense and refreshes the balances of the funds it referenced.
pub async fn delete_expense(db: &DatabaseConnection, expense_id: i64) -> Result<()> {
    let existing = Expense::find_by_id(expense_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Validation {
            message: format!("Expense {expense_id} not found"),
        })?;

    let funds = touched_funds(existing.source_fund_id, existing.destination_fund_id);
    existing.delete(db).await?;
    balance::recalculate_touched(db, &funds).await?;

    info!(expense_id, "Deleted expense");
    Ok(())
}

/// Retrieves all expenses under a category, newest first.
pub async fn list_expenses_for_category(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Vec<expense::Model>> {
    Expense::find()
        .filter(expense::Column::CategoryId.eq(category_id))
        .order_by_desc(expense::Column::Date)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_expense_amount_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let category = create_test_category(&db, "Misc").await?;

        for bad_amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = create_expense(
                &db,
                &cache,
                NewExpense {
                    category_id: category.id,
                    source_fund_id: fund.id,
                    destination_fund_id: None,
                    amount: bad_amount,
                    payment_method: "card".to_string(),
                    description: "bad".to_string(),
                    date: today(),
                },
            )
            .await;
            assert!(matches!(
                result.unwrap_err(),
                Error::InvalidAmount { amount: _ }
            ));
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_same_fund_transfer_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let category = create_test_category(&db, "Misc").await?;

        let result = create_expense(
            &db,
            &cache,
            NewExpense {
                category_id: category.id,
                source_fund_id: fund.id,
                destination_fund_id: Some(fund.id),
                amount: 10.0,
                payment_method: "card".to_string(),
                description: "self transfer".to_string(),
                date: today(),
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::SameFundTransfer { fund_id } if fund_id == fund.id
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_ineligible_source_fund_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let related = create_test_fund(&db, "Related").await?;
        let unrelated = create_test_fund(&db, "Unrelated").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund(&db, category.id, related.id).await?;

        let result = create_expense(
            &db,
            &cache,
            NewExpense {
                category_id: category.id,
                source_fund_id: unrelated.id,
                destination_fund_id: None,
                amount: 10.0,
                payment_method: "card".to_string(),
                description: "wrong fund".to_string(),
                date: today(),
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::FundNotEligible { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_non_default_related_fund_is_accepted() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund_a = create_test_fund(&db, "Fund A").await?;
        let fund_b = create_test_fund(&db, "Fund B").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund_at(&db, category.id, fund_a.id, utc_datetime(2024, 1, 1)).await?;
        attach_fund_at(&db, category.id, fund_b.id, utc_datetime(2024, 1, 2)).await?;

        // F2 is eligible even though F1 is the default
        let (stored, warnings) = create_expense(
            &db,
            &cache,
            NewExpense {
                category_id: category.id,
                source_fund_id: fund_b.id,
                destination_fund_id: None,
                amount: 10.0,
                payment_method: "card".to_string(),
                description: "non-default".to_string(),
                date: today(),
            },
        )
        .await?;
        assert_eq!(stored.source_fund_id, Some(fund_b.id));
        assert!(warnings.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_unrestricted_category_warns_but_writes() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let category = create_test_category(&db, "Misc").await?;

        let (stored, warnings) = create_expense(
            &db,
            &cache,
            NewExpense {
                category_id: category.id,
                source_fund_id: fund.id,
                destination_fund_id: None,
                amount: 10.0,
                payment_method: "cash".to_string(),
                description: "anything goes".to_string(),
                date: today(),
            },
        )
        .await?;
        assert_eq!(stored.amount, 10.0);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no fund restrictions"));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_expense_refreshes_balances() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let source = create_custom_fund(&db, "Main", 100.0).await?;
        let destination = create_custom_fund(&db, "Savings", 0.0).await?;
        let category = create_test_category(&db, "Misc").await?;

        create_transfer(&db, &cache, category.id, source.id, destination.id, 30.0).await?;

        let source = crate::core::fund::get_fund(&db, source.id).await?.unwrap();
        let destination = crate::core::fund::get_fund(&db, destination.id).await?.unwrap();
        assert_eq!(source.current_balance, 70.0);
        assert_eq!(destination.current_balance, 30.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_expense_refreshes_old_and_new_funds() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund_a = create_custom_fund(&db, "Fund A", 100.0).await?;
        let fund_b = create_custom_fund(&db, "Fund B", 100.0).await?;
        let category = create_test_category(&db, "Misc").await?;

        let (stored, _) = create_expense(
            &db,
            &cache,
            NewExpense {
                category_id: category.id,
                source_fund_id: fund_a.id,
                destination_fund_id: None,
                amount: 20.0,
                payment_method: "card".to_string(),
                description: "moved later".to_string(),
                date: today(),
            },
        )
        .await?;

        // Move the expense from A to B
        update_expense(
            &db,
            &cache,
            stored.id,
            NewExpense {
                category_id: category.id,
                source_fund_id: fund_b.id,
                destination_fund_id: None,
                amount: 20.0,
                payment_method: "card".to_string(),
                description: "moved later".to_string(),
                date: today(),
            },
        )
        .await?;

        let fund_a = crate::core::fund::get_fund(&db, fund_a.id).await?.unwrap();
        let fund_b = crate::core::fund::get_fund(&db, fund_b.id).await?.unwrap();
        assert_eq!(fund_a.current_balance, 100.0);
        assert_eq!(fund_b.current_balance, 80.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_expense_refreshes_balances() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let source = create_custom_fund(&db, "Main", 100.0).await?;
        let category = create_test_category(&db, "Misc").await?;

        let expense = create_test_expense(&db, &cache, category.id, source.id, 40.0).await?;
        let mid = crate::core::fund::get_fund(&db, source.id).await?.unwrap();
        assert_eq!(mid.current_balance, 60.0);

        delete_expense(&db, expense.id).await?;
        let after = crate::core::fund::get_fund(&db, source.id).await?.unwrap();
        assert_eq!(after.current_balance, 100.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_expenses_for_category_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let groceries = create_test_category(&db, "Groceries").await?;
        let other = create_test_category(&db, "Other").await?;

        let yesterday = create_expense(
            &db,
            &cache,
            NewExpense {
                category_id: groceries.id,
                source_fund_id: fund.id,
                destination_fund_id: None,
                amount: 5.0,
                payment_method: "card".to_string(),
                description: "older".to_string(),
                date: today() - chrono::Days::new(1),
            },
        )
        .await?
        .0;
        let first_today = create_test_expense(&db, &cache, groceries.id, fund.id, 7.0).await?;
        let second_today = create_test_expense(&db, &cache, groceries.id, fund.id, 9.0).await?;
        create_test_expense(&db, &cache, other.id, fund.id, 11.0).await?;

        // Only the category's own expenses, date descending then id descending
        let listed = list_expenses_for_category(&db, groceries.id).await?;
        let ids: Vec<i64> = listed.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second_today.id, first_today.id, yesterday.id]);

        assert!(list_expenses_for_category(&db, 999).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_unknown_expense_is_error() -> Result<()> {
        let db = setup_test_db().await?;

        let result = delete_expense(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }
}
