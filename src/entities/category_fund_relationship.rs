//! Category-fund relationship entity - the many-to-many join between
//! categories and funds.
//!
//! Ordering matters: the relationship with the earliest `created_at` is the
//! category's default fund when resolution must pick one without explicit
//! user choice (ties broken by lowest id).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category-fund relationship database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "category_fund_relationships")]
pub struct Model {
    /// Unique identifier for the relationship row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category side of the association
    pub category_id: i64,
    /// Fund side of the association
    pub fund_id: i64,
    /// When the user attached the fund; earliest wins as the default
    pub created_at: DateTimeUtc,
}

/// Defines relationships between the join entity and its endpoints
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each relationship belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Each relationship belongs to one fund
    #[sea_orm(
        belongs_to = "super::fund::Entity",
        from = "Column::FundId",
        to = "super::fund::Column::Id"
    )]
    Fund,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::fund::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fund.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
