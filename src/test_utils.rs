//! Shared test utilities for `FundLedger`.
//!
//! This module provides common helper functions for setting up test
//! databases and creating test entities with sensible defaults.

use crate::{
    core::{
        cache::{RelationshipCache, RelationshipCacheConfig},
        category, expense, fund, income,
    },
    entities,
    errors::Result,
};
use chrono::{NaiveDate, TimeZone, Utc};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A fresh relationship cache with default sizing, one per test.
pub fn test_cache() -> RelationshipCache {
    RelationshipCache::new(RelationshipCacheConfig::default())
}

/// Today's date in UTC, the default for test funds and transactions.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Midnight UTC on the given day; panics only on invalid test input.
#[allow(clippy::unwrap_used)]
pub fn utc_datetime(year: i32, month: u32, day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Creates a test fund with a zero initial balance. Uses a throwaway cache;
/// tests asserting invalidation call `fund::create_fund` with their own.
pub async fn create_test_fund(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::fund::Model> {
    fund::create_fund(db, &test_cache(), name.to_string(), None, 0.0, today()).await
}

/// Creates a test fund with a custom initial balance.
pub async fn create_custom_fund(
    db: &DatabaseConnection,
    name: &str,
    initial_balance: f64,
) -> Result<entities::fund::Model> {
    fund::create_fund(db, &test_cache(), name.to_string(), None, initial_balance, today()).await
}

/// Creates a test category with no fund association (unrestricted).
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, name.to_string(), None).await
}

/// Creates a test category carrying a legacy single-fund pointer.
pub async fn create_category_with_legacy_fund(
    db: &DatabaseConnection,
    name: &str,
    fund_id: i64,
) -> Result<entities::category::Model> {
    category::create_category(db, name.to_string(), Some(fund_id)).await
}

/// Attaches a fund to a category with the current timestamp, bypassing the
/// cache (tests construct their own cache instances).
pub async fn attach_fund(
    db: &DatabaseConnection,
    category_id: i64,
    fund_id: i64,
) -> Result<entities::category_fund_relationship::Model> {
    attach_fund_at(db, category_id, fund_id, Utc::now()).await
}

/// Attaches a fund to a category with an explicit `created_at`, for tests
/// that depend on relationship ordering.
pub async fn attach_fund_at(
    db: &DatabaseConnection,
    category_id: i64,
    fund_id: i64,
    created_at: chrono::DateTime<Utc>,
) -> Result<entities::category_fund_relationship::Model> {
    let relationship = entities::category_fund_relationship::ActiveModel {
        category_id: Set(category_id),
        fund_id: Set(fund_id),
        created_at: Set(created_at),
        ..Default::default()
    };
    relationship.insert(db).await.map_err(Into::into)
}

/// Creates a plain (non-transfer) test expense through the full write path.
pub async fn create_test_expense(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    category_id: i64,
    source_fund_id: i64,
    amount: f64,
) -> Result<entities::expense::Model> {
    let (model, _warnings) = expense::create_expense(
        db,
        cache,
        expense::NewExpense {
            category_id,
            source_fund_id,
            destination_fund_id: None,
            amount,
            payment_method: "card".to_string(),
            description: "Test expense".to_string(),
            date: today(),
        },
    )
    .await?;
    Ok(model)
}

/// Creates a transfer-expense between two funds through the full write path.
pub async fn create_transfer(
    db: &DatabaseConnection,
    cache: &RelationshipCache,
    category_id: i64,
    source_fund_id: i64,
    destination_fund_id: i64,
    amount: f64,
) -> Result<entities::expense::Model> {
    let (model, _warnings) = expense::create_expense(
        db,
        cache,
        expense::NewExpense {
            category_id,
            source_fund_id,
            destination_fund_id: Some(destination_fund_id),
            amount,
            payment_method: "transfer".to_string(),
            description: "Test transfer".to_string(),
            date: today(),
        },
    )
    .await?;
    Ok(model)
}

/// Creates a test income through the full write path.
pub async fn create_test_income(
    db: &DatabaseConnection,
    fund_id: i64,
    amount: f64,
) -> Result<entities::income::Model> {
    income::create_income(
        db,
        income::NewIncome {
            fund_id,
            amount,
            description: "Test income".to_string(),
            date: today(),
        },
    )
    .await
}

/// Inserts an expense row directly with `source_fund_id` NULL, simulating a
/// pre-migration historical row that the normal write path would reject.
pub async fn insert_legacy_expense(
    db: &DatabaseConnection,
    category_id: i64,
    amount: f64,
) -> Result<entities::expense::Model> {
    let row = entities::expense::ActiveModel {
        category_id: Set(category_id),
        source_fund_id: Set(None),
        destination_fund_id: Set(None),
        amount: Set(amount),
        payment_method: Set("cash".to_string()),
        description: Set("Legacy expense".to_string()),
        date: Set(today()),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}
