//! Expense lines within a budget.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{BudgetExpenseId, BudgetId, Error, UserID, budget::core::get_budget};

/// A named share of a budget, e.g. "Flights" within "Holiday".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetExpense {
    /// The ID of the expense line.
    pub id: BudgetExpenseId,
    /// The budget the expense line belongs to.
    pub budget_id: BudgetId,
    /// A short name for the expense line.
    pub name: String,
    /// How much of the budget is set aside for this line.
    pub allocated_amount: f64,
    /// How much has been spent on this line so far.
    pub current_amount: f64,
}

/// The user-editable fields of a budget expense.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetExpenseRequest {
    /// See [BudgetExpense::name].
    pub name: String,
    /// See [BudgetExpense::allocated_amount].
    pub allocated_amount: f64,
    /// See [BudgetExpense::current_amount].
    #[serde(default)]
    pub current_amount: f64,
}

impl BudgetExpenseRequest {
    fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidBudget(
                "a budget expense needs a name".to_owned(),
            ));
        }

        if !self.allocated_amount.is_finite() || self.allocated_amount < 0.0 {
            return Err(Error::InvalidBudget(
                "the allocated amount must not be negative".to_owned(),
            ));
        }

        if !self.current_amount.is_finite() {
            return Err(Error::InvalidBudget(
                "the current amount must be a number".to_owned(),
            ));
        }

        Ok(())
    }
}

const EXPENSE_COLUMNS: &str = "id, budget_id, name, allocated_amount, current_amount";

/// Add an expense line to a budget owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBudget] if the request is invalid,
/// - [Error::NotFound] if `budget_id` does not refer to a budget owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn create_budget_expense(
    user_id: UserID,
    budget_id: BudgetId,
    request: &BudgetExpenseRequest,
    connection: &Connection,
) -> Result<BudgetExpense, Error> {
    request.validate()?;
    get_budget(user_id, budget_id, connection)?;

    let expense = connection
        .prepare(&format!(
            "INSERT INTO budget_expense (budget_id, name, allocated_amount, current_amount)
             VALUES (?1, ?2, ?3, ?4)
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                budget_id,
                &request.name,
                request.allocated_amount,
                request.current_amount,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// The expense lines of a budget, in the order they were added.
///
/// Callers must check that the budget belongs to the user.
pub(crate) fn get_budget_expenses(
    budget_id: BudgetId,
    connection: &Connection,
) -> Result<Vec<BudgetExpense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM budget_expense WHERE budget_id = ?1 ORDER BY id ASC"
        ))?
        .query_map([budget_id], map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Replace the fields of an expense line.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidBudget] if the request is invalid,
/// - [Error::NotFound] if the budget is not owned by the user or the expense
///   line is not part of the budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget_expense(
    user_id: UserID,
    budget_id: BudgetId,
    id: BudgetExpenseId,
    request: &BudgetExpenseRequest,
    connection: &Connection,
) -> Result<BudgetExpense, Error> {
    request.validate()?;
    get_budget(user_id, budget_id, connection)?;

    let expense = connection
        .prepare(&format!(
            "UPDATE budget_expense SET name = ?1, allocated_amount = ?2, current_amount = ?3
             WHERE id = ?4 AND budget_id = ?5
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                &request.name,
                request.allocated_amount,
                request.current_amount,
                id,
                budget_id,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Remove an expense line from a budget.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the budget is not owned by the user or the expense
///   line is not part of the budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget_expense(
    user_id: UserID,
    budget_id: BudgetId,
    id: BudgetExpenseId,
    connection: &Connection,
) -> Result<(), Error> {
    get_budget(user_id, budget_id, connection)?;

    let rows_affected = connection.execute(
        "DELETE FROM budget_expense WHERE id = ?1 AND budget_id = ?2",
        (id, budget_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the budget expense table in the database.
///
/// Must run after the budget table exists.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget_expense (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            budget_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            allocated_amount REAL NOT NULL,
            current_amount REAL NOT NULL,
            FOREIGN KEY(budget_id) REFERENCES budget(id) ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

fn map_expense_row(row: &Row) -> Result<BudgetExpense, rusqlite::Error> {
    Ok(BudgetExpense {
        id: row.get(0)?,
        budget_id: row.get(1)?,
        name: row.get(2)?,
        allocated_amount: row.get(3)?,
        current_amount: row.get(4)?,
    })
}
