//! Relationship resolver - determines which funds a category may draw from.
//!
//! Two data sources feed resolution, with a strict precedence: explicit
//! `category_fund_relationships` rows always win; the category's legacy
//! `fund_id` pointer is consulted only when no relationship rows exist; a
//! category with neither is unrestricted and accepts any fund. The
//! [`ResolutionSource`] tag on every result records which step produced it,
//! so callers never re-derive the precedence themselves.

use crate::{
    core::cache::RelationshipCache,
    entities::{
        Category, CategoryFundRelationship, Expense, Fund, category_fund_relationship, expense,
        fund,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, prelude::*};
use serde::Serialize;
use tracing::debug;

/// Which precedence step produced a resolution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionSource {
    /// Explicit many-to-many relationship rows
    Relationships,
    /// The category's legacy single-fund pointer
    LegacyFund,
    /// Neither source exists; any fund is acceptable
    Unrestricted,
}

/// The set of funds a category may draw from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFunds {
    /// Eligible funds, in relationship creation order when restricted
    pub funds: Vec<fund::Model>,
    /// False only for unrestricted categories
    pub has_restrictions: bool,
    /// Which precedence step produced this result
    pub source: ResolutionSource,
}

/// Outcome of checking whether a category-fund relationship may be removed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletionCheck {
    /// Advisory warnings; the removal is still permitted
    pub warnings: Vec<String>,
    /// Expenses under the category recorded against the fund being removed
    pub expense_count: u64,
    /// Relationship rows the category would retain after the removal
    pub remaining_fund_relationships: u64,
}

async fn require_category<C>(db: &C, category_id: i64) -> Result<crate::entities::CategoryModel>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { category_id })
}

async fn require_fund<C>(db: &C, fund_id: i64) -> Result<fund::Model>
where
    C: ConnectionTrait,
{
    Fund::find_by_id(fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound { fund_id })
}

/// Returns the category's relationship rows in default-precedence order
/// (earliest `created_at` first, ties broken by lowest id).
pub async fn relationships_for_category<C>(
    db: &C,
    category_id: i64,
) -> Result<Vec<category_fund_relationship::Model>>
where
    C: ConnectionTrait,
{
    CategoryFundRelationship::find()
        .filter(category_fund_relationship::Column::CategoryId.eq(category_id))
        .order_by_asc(category_fund_relationship::Column::CreatedAt)
        .order_by_asc(category_fund_relationship::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves the set of funds the category may draw from.
///
/// Precedence: relationship rows, then the legacy `fund_id`, then the full
/// fund list (unrestricted).
pub async fn resolve_funds_for_category<C>(db: &C, category_id: i64) -> Result<ResolvedFunds>
where
    C: ConnectionTrait,
{
    let category = require_category(db, category_id).await?;

    let relationships = relationships_for_category(db, category_id).await?;
    if !relationships.is_empty() {
        let fund_ids: Vec<i64> = relationships.iter().map(|r| r.fund_id).collect();
        let mut funds = Fund::find()
            .filter(fund::Column::Id.is_in(fund_ids.clone()))
            .all(db)
            .await?;
        // Present funds in relationship creation order
        funds.sort_by_key(|f| fund_ids.iter().position(|id| *id == f.id));
        debug!(
            category_id,
            fund_count = funds.len(),
            "Resolved funds from relationship rows"
        );
        return Ok(ResolvedFunds {
            funds,
            has_restrictions: true,
            source: ResolutionSource::Relationships,
        });
    }

    if let Some(legacy_fund_id) = category.fund_id {
        let fund = require_fund(db, legacy_fund_id).await?;
        debug!(category_id, legacy_fund_id, "Resolved fund from legacy pointer");
        return Ok(ResolvedFunds {
            funds: vec![fund],
            has_restrictions: true,
            source: ResolutionSource::LegacyFund,
        });
    }

    let funds = Fund::find().order_by_asc(fund::Column::Name).all(db).await?;
    debug!(category_id, "Category is unrestricted; all funds eligible");
    Ok(ResolvedFunds {
        funds,
        has_restrictions: false,
        source: ResolutionSource::Unrestricted,
    })
}

/// Resolves the category's default fund: the earliest-created relationship's
/// fund, else the legacy `fund_id`, else `None` (unrestricted).
pub async fn resolve_default_fund_for_category<C>(db: &C, category_id: i64) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let category = require_category(db, category_id).await?;

    let relationships = relationships_for_category(db, category_id).await?;
    if let Some(earliest) = relationships.first() {
        return Ok(Some(earliest.fund_id));
    }

    Ok(category.fund_id)
}

/// Validates that `fund_id` is an eligible source for expenses under
/// `category_id`.
///
/// Fails closed: unknown category or fund and ineligible funds are hard
/// errors. An unrestricted category accepts any fund but yields an advisory
/// warning so the caller can surface it without blocking the write.
pub async fn validate_expense_fund_for_category<C>(
    db: &C,
    category_id: i64,
    fund_id: i64,
) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    require_fund(db, fund_id).await?;
    let resolved = resolve_funds_for_category(db, category_id).await?;
    check_resolved_fund(&resolved, category_id, fund_id)
}

fn check_resolved_fund(
    resolved: &ResolvedFunds,
    category_id: i64,
    fund_id: i64,
) -> Result<Vec<String>> {
    if !resolved.has_restrictions {
        return Ok(vec![format!(
            "Category {category_id} has no fund restrictions; any fund is accepted"
        )]);
    }

    if resolved.funds.iter().any(|f| f.id == fund_id) {
        Ok(Vec::new())
    } else {
        Err(Error::FundNotEligible {
            category_id,
            fund_id,
        })
    }
}

/// Checks whether removing the (category, fund) relationship is safe.
///
/// Missing category, fund, or relationship is a hard error. Historical
/// expenses recorded against the fund never block removal (history is
/// immutable) but are reported as warnings.
pub async fn validate_category_fund_deletion<C>(
    db: &C,
    category_id: i64,
    fund_id: i64,
) -> Result<DeletionCheck>
where
    C: ConnectionTrait,
{
    require_category(db, category_id).await?;
    require_fund(db, fund_id).await?;

    let relationships = relationships_for_category(db, category_id).await?;
    if !relationships.iter().any(|r| r.fund_id == fund_id) {
        return Err(Error::RelationshipNotFound {
            category_id,
            fund_id,
        });
    }

    let expense_count = Expense::find()
        .filter(expense::Column::CategoryId.eq(category_id))
        .filter(expense::Column::SourceFundId.eq(fund_id))
        .count(db)
        .await?;
    let remaining_fund_relationships = relationships.len() as u64 - 1;

    let mut warnings = Vec::new();
    if expense_count > 0 {
        warnings.push(format!(
            "{expense_count} expense(s) under category {category_id} were recorded against \
             fund {fund_id} and will no longer match any relationship"
        ));
        if remaining_fund_relationships == 0 {
            warnings.push(format!(
                "Fund {fund_id} is the only fund associated with category {category_id}"
            ));
        }
    }

    Ok(DeletionCheck {
        warnings,
        expense_count,
        remaining_fund_relationships,
    })
}

/// Checks a proposed replacement of the category's fund set.
///
/// Any unknown fund id is a hard error. Each fund being dropped that has
/// expense history under the category yields one warning naming the affected
/// expense count.
pub async fn validate_category_fund_update<C>(
    db: &C,
    category_id: i64,
    new_fund_ids: &[i64],
) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    require_category(db, category_id).await?;
    for &fund_id in new_fund_ids {
        require_fund(db, fund_id).await?;
    }

    let current = relationships_for_category(db, category_id).await?;
    let mut warnings = Vec::new();
    for relationship in &current {
        if new_fund_ids.contains(&relationship.fund_id) {
            continue;
        }
        let affected = Expense::find()
            .filter(expense::Column::CategoryId.eq(category_id))
            .filter(expense::Column::SourceFundId.eq(relationship.fund_id))
            .count(db)
            .await?;
        if affected > 0 {
            warnings.push(format!(
                "Removing fund {} from category {category_id} leaves {affected} existing \
                 expense(s) without a matching relationship",
                relationship.fund_id
            ));
        }
    }

    Ok(warnings)
}

/// Cache-aside variant of [`resolve_funds_for_category`].
///
/// On a miss the resolver is consulted and the result stored with the
/// default TTL. Resolver errors are propagated and never cached, so a failed
/// lookup cannot poison later attempts.
pub async fn resolve_funds_for_category_cached<C>(
    db: &C,
    cache: &RelationshipCache,
    category_id: i64,
) -> Result<ResolvedFunds>
where
    C: ConnectionTrait,
{
    if let Some(resolved) = cache.get_funds(category_id).await {
        return Ok(resolved);
    }

    let resolved = resolve_funds_for_category(db, category_id).await?;
    cache.set_funds(category_id, resolved.clone(), None).await;
    Ok(resolved)
}

/// Cache-aside variant of [`relationships_for_category`].
pub async fn relationships_for_category_cached<C>(
    db: &C,
    cache: &RelationshipCache,
    category_id: i64,
) -> Result<Vec<category_fund_relationship::Model>>
where
    C: ConnectionTrait,
{
    if let Some(relationships) = cache.get_relationships(category_id).await {
        return Ok(relationships);
    }

    let relationships = relationships_for_category(db, category_id).await?;
    cache
        .set_relationships(category_id, relationships.clone(), None)
        .await;
    Ok(relationships)
}

/// Cache-aside variant of [`validate_expense_fund_for_category`], used by
/// the expense write paths so every write does not re-query the relationship
/// table. Behavior is identical to the uncached validation.
pub async fn validate_expense_fund_for_category_cached<C>(
    db: &C,
    cache: &RelationshipCache,
    category_id: i64,
    fund_id: i64,
) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    require_fund(db, fund_id).await?;
    let resolved = resolve_funds_for_category_cached(db, cache, category_id).await?;
    check_resolved_fund(&resolved, category_id, fund_id)
}
