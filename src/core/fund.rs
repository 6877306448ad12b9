//! Fund business logic - creation, updates, and guarded deletion.
//!
//! Deleting a fund is rejected while anything still references it: a
//! category (legacy pointer or relationship row), an expense (as source or
//! destination), or an income. Identity-affecting updates and deletions
//! invalidate every cache entry referencing the fund.

use crate::{
    core::cache::RelationshipCache,
    entities::{
        Category, CategoryFundRelationship, Expense, Fund, Income, category,
        category_fund_relationship, expense, fund, income,
    },
    errors::{Error, Result},
};
use sea_orm::{Condition, PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::info;

const MAX_NAME_LENGTH: usize = 255;

async fn validate_fund_name<C>(db: &C, name: &str, exclude_id: Option<i64>) -> Result<String>
where
    C: ConnectionTrait,
{
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: "Fund name cannot be empty".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::Validation {
            message: format!("Fund name cannot exceed {MAX_NAME_LENGTH} characters"),
        });
    }

    let mut query = Fund::find().filter(fund::Column::Name.eq(trimmed));
    if let Some(id) = exclude_id {
        query = query.filter(fund::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(Error::Validation {
            message: format!("A fund named '{trimmed}' already exists"),
        });
    }

    Ok(trimmed.to_string())
}

/// Creates a new fund.
///
/// The name must be non-empty, at most 255 characters, and unique. The
/// initial balance must be finite and non-negative, and the start date must
/// not lie in the future. The stored `current_balance` starts equal to the
/// initial balance. Cached unrestricted fund sets are invalidated so they
/// pick up the new fund on the next resolution.
pub async fn create_fund(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    name: String,
    description: Option<String>,
    initial_balance: f64,
    start_date: Date,
) -> Result<fund::Model> {
    let name = validate_fund_name(db, &name, None).await?;

    if !initial_balance.is_finite() || initial_balance < 0.0 {
        return Err(Error::InvalidAmount {
            amount: initial_balance,
        });
    }

    if start_date > chrono::Utc::now().date_naive() {
        return Err(Error::Validation {
            message: format!("Fund start date {start_date} must not be in the future"),
        });
    }

    let new_fund = fund::ActiveModel {
        name: Set(name),
        description: Set(description),
        initial_balance: Set(initial_balance),
        current_balance: Set(initial_balance),
        start_date: Set(start_date),
        ..Default::default()
    };

    let result = new_fund.insert(db).await?;
    cache.invalidate_unrestricted().await;
    info!(fund_id = result.id, name = %result.name, "Created fund");
    Ok(result)
}

/// Finds a fund by its unique ID.
pub async fn get_fund<C>(db: &C, fund_id: i64) -> Result<Option<fund::Model>>
where
    C: ConnectionTrait,
{
    Fund::find_by_id(fund_id).one(db).await.map_err(Into::into)
}

/// Retrieves all funds, ordered alphabetically by name.
pub async fn list_funds<C>(db: &C) -> Result<Vec<fund::Model>>
where
    C: ConnectionTrait,
{
    Fund::find()
        .order_by_asc(fund::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates a fund's name and/or description, then invalidates every cache
/// entry referencing it so stale fund details cannot be served.
pub async fn update_fund(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    fund_id: i64,
    new_name: Option<String>,
    new_description: Option<String>,
) -> Result<fund::Model> {
    let existing = Fund::find_by_id(fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound { fund_id })?;

    let mut active: fund::ActiveModel = existing.into();
    if let Some(name) = new_name {
        let name = validate_fund_name(db, &name, Some(fund_id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = new_description {
        active.description = Set(Some(description));
    }

    let updated = active.update(db).await?;
    cache.invalidate_by_fund(fund_id).await;
    info!(fund_id, name = %updated.name, "Updated fund");
    Ok(updated)
}

/// Deletes a fund, rejected with [`Error::FundInUse`] while any category or
/// transaction still references it.
pub async fn delete_fund(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    fund_id: i64,
) -> Result<()> {
    let existing = Fund::find_by_id(fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound { fund_id })?;

    let category_refs = Category::find()
        .filter(category::Column::FundId.eq(fund_id))
        .count(db)
        .await?;
    let relationship_refs = CategoryFundRelationship::find()
        .filter(category_fund_relationship::Column::FundId.eq(fund_id))
        .count(db)
        .await?;
    let expense_refs = Expense::find()
        .filter(
            Condition::any()
                .add(expense::Column::SourceFundId.eq(fund_id))
                .add(expense::Column::DestinationFundId.eq(fund_id)),
        )
        .count(db)
        .await?;
    let income_refs = Income::find()
        .filter(income::Column::FundId.eq(fund_id))
        .count(db)
        .await?;

    let mut reasons = Vec::new();
    if category_refs + relationship_refs > 0 {
        reasons.push(format!(
            "{} category reference(s)",
            category_refs + relationship_refs
        ));
    }
    if expense_refs + income_refs > 0 {
        reasons.push(format!(
            "{} transaction reference(s)",
            expense_refs + income_refs
        ));
    }
    if !reasons.is_empty() {
        return Err(Error::FundInUse {
            fund_id,
            reason: reasons.join(", "),
        });
    }

    existing.delete(db).await?;
    cache.invalidate_by_fund(fund_id).await;
    info!(fund_id, "Deleted fund");
    Ok(())
}
