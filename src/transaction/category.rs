//! The fixed transaction types and recurrence intervals offered to the frontend.

use axum::Json;

use crate::recurrence::IntervalKind;

/// The transaction types for income.
pub const INCOME_TYPES: [&str; 6] = [
    "Salary",
    "Passive",
    "Capital Gains",
    "Dividend",
    "Government Payment",
    "Other",
];

/// The transaction types for expenses.
pub const EXPENSE_TYPES: [&str; 11] = [
    "Mortgage",
    "Rent",
    "Utilities",
    "Fixed",
    "Groceries",
    "Insurance",
    "Travel",
    "Taxes",
    "Interest",
    "Subscriptions",
    "Other",
];

/// A route handler listing the recurrence intervals.
pub async fn get_intervals() -> Json<[IntervalKind; 4]> {
    Json(IntervalKind::ALL)
}

/// A route handler listing the income transaction types.
pub async fn get_income_types() -> Json<[&'static str; 6]> {
    Json(INCOME_TYPES)
}

/// A route handler listing the expense transaction types.
pub async fn get_expense_types() -> Json<[&'static str; 11]> {
    Json(EXPENSE_TYPES)
}
