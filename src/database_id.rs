//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;

/// Database identifier for a category.
pub type CategoryId = DatabaseID;

/// Database identifier for a transaction.
pub type TransactionId = DatabaseID;

/// Database identifier for a budget.
pub type BudgetId = DatabaseID;
