//! Assigning transactions to budgets.
//!
//! A transaction can belong to at most one budget, and only while its date
//! lies within the budget's date range.

use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    BudgetId, Error, TransactionId, UserID,
    budget::core::get_budget,
    recurrence::DateRange,
    transaction::{
        Transaction, get_transaction, map_transaction_row, set_transaction_budget,
    },
};

/// Assign a transaction to a budget.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the budget or the transaction is not owned by the user,
/// - [Error::InvalidBudget] if the transaction is dated outside the budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn assign_transaction(
    user_id: UserID,
    budget_id: BudgetId,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let budget = get_budget(user_id, budget_id, connection)?;
    let transaction = get_transaction(user_id, transaction_id, connection)?;

    if !budget.range().contains(transaction.date) {
        return Err(Error::InvalidBudget(format!(
            "the transaction on {} is outside the budget from {} to {}",
            transaction.date, budget.start_date, budget.end_date
        )));
    }

    set_transaction_budget(user_id, transaction_id, Some(budget_id), connection)?;
    get_transaction(user_id, transaction_id, connection)
}

/// Remove a transaction from a budget.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the budget or the transaction is not owned by the
///   user, or the transaction is not assigned to the budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn unassign_transaction(
    user_id: UserID,
    budget_id: BudgetId,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    get_budget(user_id, budget_id, connection)?;
    let transaction = get_transaction(user_id, transaction_id, connection)?;

    if transaction.budget_id != Some(budget_id) {
        return Err(Error::NotFound);
    }

    set_transaction_budget(user_id, transaction_id, None, connection)
}

/// The transactions assigned to a budget, ordered by date.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the budget is not owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget_transactions(
    user_id: UserID,
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    get_budget(user_id, budget_id, connection)?;

    connection
        .prepare(
            "SELECT id, user_id, recurring_transaction_id, budget_id, amount, date, description, \
             category, created, updated
             FROM \"transaction\" WHERE user_id = ?1 AND budget_id = ?2
             ORDER BY date ASC, id ASC",
        )?
        .query_map((user_id.as_i64(), budget_id), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Unassign the transactions of a budget dated outside `range`.
///
/// Returns the number of transactions unassigned.
pub(crate) fn unassign_outside_range(
    user_id: UserID,
    budget_id: BudgetId,
    range: DateRange,
    connection: &Connection,
) -> Result<usize, Error> {
    connection
        .execute(
            "UPDATE \"transaction\" SET budget_id = NULL, updated = ?1
             WHERE user_id = ?2 AND budget_id = ?3 AND (date < ?4 OR date >= ?5)",
            (
                OffsetDateTime::now_utc(),
                user_id.as_i64(),
                budget_id,
                range.start,
                range.end,
            ),
        )
        .map_err(|error| error.into())
}

/// Unassign `transaction` from its budget if its date has moved outside the budget.
///
/// Returns the transaction as it is stored afterwards.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn unassign_if_outside_budget(
    user_id: UserID,
    transaction: Transaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let Some(budget_id) = transaction.budget_id else {
        return Ok(transaction);
    };

    let budget = get_budget(user_id, budget_id, connection)?;
    if budget.range().contains(transaction.date) {
        return Ok(transaction);
    }

    tracing::debug!(
        "Unassigning transaction {} from budget {budget_id}, {} is outside the budget",
        transaction.id,
        transaction.date
    );
    set_transaction_budget(user_id, transaction.id, None, connection)?;
    get_transaction(user_id, transaction.id, connection)
}
