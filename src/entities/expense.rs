//! Expense entity - money leaving a fund.
//!
//! `source_fund_id` is the fund the expense debits; it is nullable only to
//! admit historical rows created before the source-fund backfill ran. A
//! non-null `destination_fund_id` makes the expense a fund-to-fund transfer
//! and must differ from the source.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    /// Unique identifier for the expense
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category the expense is classified under
    pub category_id: i64,
    /// Fund the money leaves; null only for pre-migration rows
    pub source_fund_id: Option<i64>,
    /// Fund the money arrives at; presence makes this expense a transfer
    pub destination_fund_id: Option<i64>,
    /// Amount debited from the source fund, always positive
    pub amount: f64,
    /// How the expense was paid (e.g., "cash", "card")
    pub payment_method: String,
    /// Human-readable description of the expense
    pub description: String,
    /// Date the expense occurred
    pub date: Date,
}

/// Defines relationships between Expense and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each expense belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Fund the expense debits
    #[sea_orm(
        belongs_to = "super::fund::Entity",
        from = "Column::SourceFundId",
        to = "super::fund::Column::Id"
    )]
    SourceFund,
    /// Fund a transfer-expense credits
    #[sea_orm(
        belongs_to = "super::fund::Entity",
        from = "Column::DestinationFundId",
        to = "super::fund::Column::Id"
    )]
    DestinationFund,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
