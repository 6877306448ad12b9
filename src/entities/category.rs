//! Category entity - An expense/income classification.
//!
//! The optional `fund_id` is the legacy single-fund pointer. It is consulted
//! only when no `category_fund_relationships` rows exist for the category;
//! relationship rows always take precedence.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name of the category (e.g., "Groceries")
    pub name: String,
    /// Legacy single-fund assignment, superseded by relationship rows
    pub fund_id: Option<i64>,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One category has many category-fund relationships
    #[sea_orm(has_many = "super::category_fund_relationship::Entity")]
    CategoryFundRelationships,
    /// Legacy pointer to a single fund
    #[sea_orm(
        belongs_to = "super::fund::Entity",
        from = "Column::FundId",
        to = "super::fund::Column::Id"
    )]
    LegacyFund,
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::category_fund_relationship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryFundRelationships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
