//! Transactions, one-off and recurring.
//!
//! This module contains:
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for transactions and recurring transactions
//!
//! The scheduling logic behind recurring transactions lives in
//! [crate::recurrence]; the handlers here only parse requests and lock the
//! database.

mod category;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod list_endpoint;
mod query;
mod recurring_endpoint;
mod request;
mod state;

pub use category::{EXPENSE_TYPES, INCOME_TYPES, get_expense_types, get_income_types, get_intervals};
pub use core::{
    Transaction, TransactionBuilder, create_transaction, create_transaction_table,
    delete_recurrence_occurrences, delete_recurrence_occurrences_from, get_recurrence_occurrences,
    get_transaction, get_transactions_in_range, map_transaction_row, set_transaction_budget,
    update_transaction_fields,
};
#[cfg(test)]
pub use core::update_transaction;
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use list_endpoint::{
    get_transaction_endpoint, list_transactions_endpoint, list_unassigned_transactions_endpoint,
};
pub use query::{MonthQuery, YearQuery, matches_income_filter};
pub use recurring_endpoint::{
    delete_recurring_endpoint, get_recurring_endpoint, update_recurring_endpoint,
};
pub use state::TransactionState;
