//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod category_fund_relationship;
pub mod expense;
pub mod fund;
pub mod income;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use category_fund_relationship::{
    Column as RelationshipColumn, Entity as CategoryFundRelationship, Model as RelationshipModel,
};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use fund::{Column as FundColumn, Entity as Fund, Model as FundModel};
pub use income::{Column as IncomeColumn, Entity as Income, Model as IncomeModel};
