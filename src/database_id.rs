//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a transaction, one-off or recurring.
pub type TransactionId = DatabaseId;
/// The ID of a recurrence rule.
pub type RecurrenceId = DatabaseId;
/// The ID of a budget.
pub type BudgetId = DatabaseId;
/// The ID of an expense line within a budget.
pub type BudgetExpenseId = DatabaseId;
