//! Core business logic - framework-agnostic fund ledger operations.
//!
//! Everything with a real invariant lives here: fund resolution precedence,
//! the relationship cache, balance recomputation, transfer validation, and
//! the source-fund backfill. The persistence layer is passed in; nothing in
//! this module owns a connection.

/// Authoritative fund balance recomputation
pub mod balance;
/// TTL/LRU-bounded cache of category-fund resolution results
pub mod cache;
/// Category CRUD and category-fund relationship editing
pub mod category;
/// Expense write paths, including transfer validation
pub mod expense;
/// Fund CRUD with deletion guards
pub mod fund;
/// Income write paths
pub mod income;
/// Source-fund backfill and migration status reporting
pub mod migration;
/// Category-to-fund resolution with relationship/legacy precedence
pub mod resolver;
