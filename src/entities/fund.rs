//! Fund entity - Represents a named pool of money.
//!
//! Each fund carries an immutable `initial_balance` and a derived
//! `current_balance`. The stored `current_balance` is a cache of the balance
//! projection and is overwritten by recalculation, never incrementally
//! trusted when integrity is in question.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fund database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "funds")]
pub struct Model {
    /// Unique identifier for the fund
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable name of the fund, unique across all funds
    #[sea_orm(unique)]
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Balance the fund started with; never changes after creation
    pub initial_balance: f64,
    /// Cached balance projection; may be negative
    pub current_balance: f64,
    /// Date the fund came into existence
    pub start_date: Date,
}

/// Defines relationships between Fund and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One fund has many incomes
    #[sea_orm(has_many = "super::income::Entity")]
    Incomes,
    /// One fund is referenced by many category-fund relationships
    #[sea_orm(has_many = "super::category_fund_relationship::Entity")]
    CategoryFundRelationships,
}

impl Related<super::income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incomes.def()
    }
}

impl Related<super::category_fund_relationship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryFundRelationships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
