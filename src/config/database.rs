//! Database configuration module for `FundLedger`.
//!
//! This module handles `SQLite` table creation using `SeaORM`. It uses
//! `Schema::create_table_from_entity` to generate SQL from the entity
//! definitions, so the database schema always matches the Rust struct
//! definitions without manual SQL. The connection URL itself is resolved by
//! [`crate::config::AppConfig::database_url`].

use crate::entities::{Category, CategoryFundRelationship, Expense, Fund, Income};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, DatabaseConnection, Schema};

/// Creates all necessary database tables using `SeaORM`'s schema generation
/// from entity definitions.
///
/// Creates tables for funds, categories, category-fund relationships,
/// expenses, and incomes. Referential integrity between them is the store's
/// job; the business invariants (precedence, eligibility, transfer rules)
/// live in [`crate::core`].
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = [
        schema.create_table_from_entity(Fund),
        schema.create_table_from_entity(Category),
        schema.create_table_from_entity(CategoryFundRelationship),
        schema.create_table_from_entity(Expense),
        schema.create_table_from_entity(Income),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    Ok(())
}
