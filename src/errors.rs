//! Unified error types for the fund ledger engine.
//!
//! Errors follow the taxonomy of the engine: not-found and validation
//! failures are hard errors with structured fields naming the offending
//! entity; storage failures wrap `sea_orm::DbErr` unmodified and are never
//! retried here. Advisory conditions (orphaned history, unrestricted
//! categories) are surfaced as warnings alongside success results, not as
//! variants of this enum.

use thiserror::Error;

/// All errors the engine can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// A business rule was violated that has no more specific variant
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the violated rule
        message: String,
    },

    /// A monetary amount was zero, negative, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: f64,
    },

    /// The referenced fund does not exist
    #[error("Fund not found: {fund_id}")]
    FundNotFound {
        /// ID of the missing fund
        fund_id: i64,
    },

    /// The referenced category does not exist
    #[error("Category not found: {category_id}")]
    CategoryNotFound {
        /// ID of the missing category
        category_id: i64,
    },

    /// No relationship row links the category to the fund
    #[error("No relationship between category {category_id} and fund {fund_id}")]
    RelationshipNotFound {
        /// Category side of the missing relationship
        category_id: i64,
        /// Fund side of the missing relationship
        fund_id: i64,
    },

    /// The fund is not in the category's resolved eligible set
    #[error("Fund {fund_id} is not associated with category {category_id}")]
    FundNotEligible {
        /// Category whose eligible set was consulted
        category_id: i64,
        /// Fund that failed eligibility
        fund_id: i64,
    },

    /// An expense declared the same fund as source and destination
    #[error("Cannot transfer money to the same fund (fund {fund_id})")]
    SameFundTransfer {
        /// The fund named on both sides
        fund_id: i64,
    },

    /// The fund is still referenced and cannot be deleted
    #[error("Fund {fund_id} is in use: {reason}")]
    FundInUse {
        /// Fund whose deletion was rejected
        fund_id: i64,
        /// What still references it
        reason: String,
    },

    /// Database error from the persistence layer, propagated unmodified
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (configuration file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
