//! Category business logic - creation and category-fund relationship
//! editing.
//!
//! Every mutation of a category's relationships invalidates that category's
//! cache entries as part of the same logical operation, so the resolver
//! never serves a fund set that no longer exists.

use crate::{
    core::{
        cache::RelationshipCache,
        resolver::{
            self, DeletionCheck, relationships_for_category, validate_category_fund_deletion,
            validate_category_fund_update,
        },
    },
    entities::{Category, CategoryFundRelationship, Fund, category, category_fund_relationship},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::info;

/// Creates a new category, optionally carrying a legacy single-fund pointer
/// (which must reference an existing fund).
pub async fn create_category<C>(
    db: &C,
    name: String,
    legacy_fund_id: Option<i64>,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Category name cannot be empty".to_string(),
        });
    }

    if let Some(fund_id) = legacy_fund_id {
        Fund::find_by_id(fund_id)
            .one(db)
            .await?
            .ok_or(Error::FundNotFound { fund_id })?;
    }

    let new_category = category::ActiveModel {
        name: Set(name.trim().to_string()),
        fund_id: Set(legacy_fund_id),
        ..Default::default()
    };

    let result = new_category.insert(db).await?;
    info!(category_id = result.id, name = %result.name, "Created category");
    Ok(result)
}

/// Finds a category by its unique ID.
pub async fn get_category<C>(db: &C, category_id: i64) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Attaches a fund to a category, creating a relationship row stamped with
/// the current time. Duplicate attachments are rejected. Invalidates the
/// category's cache entries.
pub async fn attach_fund_to_category(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    category_id: i64,
    fund_id: i64,
) -> Result<category_fund_relationship::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::CategoryNotFound { category_id })?;
    Fund::find_by_id(fund_id)
        .one(db)
        .await?
        .ok_or(Error::FundNotFound { fund_id })?;

    let existing = CategoryFundRelationship::find()
        .filter(category_fund_relationship::Column::CategoryId.eq(category_id))
        .filter(category_fund_relationship::Column::FundId.eq(fund_id))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Validation {
            message: format!("Fund {fund_id} is already associated with category {category_id}"),
        });
    }

    let relationship = category_fund_relationship::ActiveModel {
        category_id: Set(category_id),
        fund_id: Set(fund_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let result = relationship.insert(db).await?;

    cache.invalidate(category_id).await;
    info!(category_id, fund_id, "Attached fund to category");
    Ok(result)
}

/// Replaces the category's fund set with `new_fund_ids`.
///
/// Retained relationships keep their original `created_at`, so the
/// category's default fund survives edits that keep it. Additions and
/// removals happen in one transaction; the category's cache entries are
/// invalidated afterwards. Returns the validation warnings (one per removed
/// fund with expense history).
pub async fn update_category_funds(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    category_id: i64,
    new_fund_ids: &[i64],
) -> Result<Vec<String>> {
    let warnings = validate_category_fund_update(db, category_id, new_fund_ids).await?;

    let current = relationships_for_category(db, category_id).await?;
    let current_fund_ids: Vec<i64> = current.iter().map(|r| r.fund_id).collect();

    let txn = db.begin().await?;
    for relationship in &current {
        if !new_fund_ids.contains(&relationship.fund_id) {
            relationship.clone().delete(&txn).await?;
        }
    }
    let now = chrono::Utc::now();
    for &fund_id in new_fund_ids {
        if !current_fund_ids.contains(&fund_id) {
            let relationship = category_fund_relationship::ActiveModel {
                category_id: Set(category_id),
                fund_id: Set(fund_id),
                created_at: Set(now),
                ..Default::default()
            };
            relationship.insert(&txn).await?;
        }
    }
    txn.commit().await?;

    cache.invalidate(category_id).await;
    info!(
        category_id,
        fund_count = new_fund_ids.len(),
        warning_count = warnings.len(),
        "Updated category fund set"
    );
    Ok(warnings)
}

/// Removes a single (category, fund) relationship.
///
/// Historical expenses never block the removal; the returned
/// [`DeletionCheck`] carries the warnings the caller must surface.
pub async fn remove_category_fund(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    category_id: i64,
    fund_id: i64,
) -> Result<DeletionCheck> {
    let check = validate_category_fund_deletion(db, category_id, fund_id).await?;

    CategoryFundRelationship::delete_many()
        .filter(category_fund_relationship::Column::CategoryId.eq(category_id))
        .filter(category_fund_relationship::Column::FundId.eq(fund_id))
        .exec(db)
        .await?;

    cache.invalidate(category_id).await;
    info!(
        category_id,
        fund_id,
        warning_count = check.warnings.len(),
        "Removed category-fund relationship"
    );
    Ok(check)
}

/// Convenience lookup combining the cache and the resolver, exposed for
/// callers that only need the raw relationship rows.
pub async fn category_relationships_cached(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    category_id: i64,
) -> Result<Vec<category_fund_relationship::Model>> {
    resolver::relationships_for_category_cached(db, cache, category_id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_category_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_category(&db, "  ".to_string(), None).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_category(&db, "Groceries".to_string(), Some(999)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::FundNotFound { fund_id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_category_roundtrip() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_category(&db, "Groceries").await?;

        let found = get_category(&db, created.id).await?.unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, "Groceries");

        assert!(get_category(&db, 999).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_attach_fund_rejects_duplicates() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let category = create_test_category(&db, "Groceries").await?;

        attach_fund_to_category(&db, &cache, category.id, fund.id).await?;
        let result = attach_fund_to_category(&db, &cache, category.id, fund.id).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_attach_fund_invalidates_cache() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund_a = create_test_fund(&db, "Fund A").await?;
        let fund_b = create_test_fund(&db, "Fund B").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund_to_category(&db, &cache, category.id, fund_a.id).await?;

        // Warm the cache with the single-fund set
        let resolved =
            resolver::resolve_funds_for_category_cached(&db, &cache, category.id).await?;
        assert_eq!(resolved.funds.len(), 1);

        // Attaching another fund must not leave the stale set served
        attach_fund_to_category(&db, &cache, category.id, fund_b.id).await?;
        let resolved =
            resolver::resolve_funds_for_category_cached(&db, &cache, category.id).await?;
        assert_eq!(resolved.funds.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_category_funds_preserves_retained_created_at() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund_a = create_test_fund(&db, "Fund A").await?;
        let fund_b = create_test_fund(&db, "Fund B").await?;
        let fund_c = create_test_fund(&db, "Fund C").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund_at(&db, category.id, fund_a.id, utc_datetime(2024, 1, 1)).await?;
        attach_fund_at(&db, category.id, fund_b.id, utc_datetime(2024, 1, 2)).await?;

        // Keep A, drop B, add C
        let warnings =
            update_category_funds(&db, &cache, category.id, &[fund_a.id, fund_c.id]).await?;
        assert!(warnings.is_empty());

        let relationships = relationships_for_category(&db, category.id).await?;
        assert_eq!(relationships.len(), 2);
        // A kept its original timestamp, so it remains the default
        assert_eq!(relationships[0].fund_id, fund_a.id);
        assert_eq!(relationships[0].created_at, utc_datetime(2024, 1, 1));
        assert_eq!(relationships[1].fund_id, fund_c.id);

        let default =
            resolver::resolve_default_fund_for_category(&db, category.id).await?;
        assert_eq!(default, Some(fund_a.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_category_funds_reports_orphan_warnings() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund_a = create_test_fund(&db, "Fund A").await?;
        let fund_b = create_test_fund(&db, "Fund B").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund(&db, category.id, fund_a.id).await?;
        create_test_expense(&db, &cache, category.id, fund_a.id, 12.0).await?;

        let warnings = update_category_funds(&db, &cache, category.id, &[fund_b.id]).await?;
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("1 existing"));

        // The replacement still happened; history is immutable but the set changed
        let relationships = relationships_for_category(&db, category.id).await?;
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].fund_id, fund_b.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_category_relationships_cached_roundtrip() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund(&db, category.id, fund.id).await?;

        let direct = relationships_for_category(&db, category.id).await?;
        let cached = category_relationships_cached(&db, &cache, category.id).await?;
        assert_eq!(direct, cached);
        assert!(cache.get_relationships(category.id).await.is_some());

        // Removing the relationship invalidates the cached rows
        remove_category_fund(&db, &cache, category.id, fund.id).await?;
        assert!(cache.get_relationships(category.id).await.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_remove_category_fund_roundtrip() -> Result<()> {
        let db = setup_test_db().await?;
        let cache = test_cache();
        let fund = create_test_fund(&db, "Main").await?;
        let category = create_test_category(&db, "Groceries").await?;
        attach_fund(&db, category.id, fund.id).await?;

        let check = remove_category_fund(&db, &cache, category.id, fund.id).await?;
        assert_eq!(check.expense_count, 0);
        assert!(check.warnings.is_empty());

        let relationships = relationships_for_category(&db, category.id).await?;
        assert!(relationships.is_empty());

        // A second removal is a hard error: the relationship is gone
        let result = remove_category_fund(&db, &cache, category.id, fund.id).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::RelationshipNotFound { .. }
        ));

        Ok(())
    }
}
