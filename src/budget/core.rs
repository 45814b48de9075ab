//! Defines the budget model and its database queries.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    BudgetId, Error, UserID,
    budget::{
        assignment::unassign_outside_range,
        expense::{BudgetExpense, get_budget_expenses},
    },
    recurrence::DateRange,
};

/// The longest budget description accepted, in characters.
pub const MAX_BUDGET_DESCRIPTION_LENGTH: usize = 256;

/// An amount of money set aside for a period, split into expense lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user that owns the budget.
    pub user_id: UserID,
    /// A short name, e.g. "Holiday".
    pub name: String,
    /// What the budget is for.
    pub description: String,
    /// The total amount of money in the budget.
    pub amount: f64,
    /// The first day of the budget.
    pub start_date: Date,
    /// The last day of the budget, inclusive.
    pub end_date: Date,
    /// When the budget was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// When the budget was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
    /// The expense lines of the budget.
    pub expenses: Vec<BudgetExpense>,
}

impl Budget {
    /// The dates covered by the budget.
    pub fn range(&self) -> DateRange {
        DateRange::inclusive(self.start_date, self.end_date)
    }
}

/// The user-editable fields of a budget.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    /// See [Budget::name].
    pub name: String,
    /// See [Budget::description].
    pub description: String,
    /// See [Budget::amount].
    pub amount: f64,
    /// See [Budget::start_date].
    pub start_date: Date,
    /// See [Budget::end_date].
    pub end_date: Date,
}

impl BudgetRequest {
    /// Check the fields of the request.
    ///
    /// # Errors
    /// Returns an [Error::InvalidBudget] if the name is empty, the description
    /// is empty or too long, or the amount is not a positive number. Returns
    /// an [Error::InvalidDateRange] if the start date is after the end date.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidBudget("a budget needs a name".to_owned()));
        }

        let description_length = self.description.chars().count();
        if description_length == 0 || description_length > MAX_BUDGET_DESCRIPTION_LENGTH {
            return Err(Error::InvalidBudget(format!(
                "the description must be between 1 and {MAX_BUDGET_DESCRIPTION_LENGTH} characters"
            )));
        }

        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidBudget(
                "the amount must be greater than zero".to_owned(),
            ));
        }

        if self.start_date > self.end_date {
            return Err(Error::InvalidDateRange);
        }

        Ok(())
    }
}

const BUDGET_COLUMNS: &str =
    "id, user_id, name, description, amount, start_date, end_date, created, updated";

/// Create a budget for `user_id`.
///
/// # Errors
/// Returns a validation error from [BudgetRequest::validate], or an
/// [Error::SqlError] if there is an SQL error.
pub fn create_budget(
    user_id: UserID,
    request: &BudgetRequest,
    connection: &Connection,
) -> Result<Budget, Error> {
    request.validate()?;

    let budget = connection
        .prepare(&format!(
            "INSERT INTO budget (user_id, name, description, amount, start_date, end_date, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                &request.name,
                &request.description,
                request.amount,
                request.start_date,
                request.end_date,
                OffsetDateTime::now_utc(),
            ),
            map_budget_row,
        )?;

    Ok(budget)
}

/// Retrieve a budget owned by `user_id`, with its expenses.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let mut budget = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row((id, user_id.as_i64()), map_budget_row)?;

    budget.expenses = get_budget_expenses(id, connection)?;

    Ok(budget)
}

/// Retrieve every budget owned by `user_id`, with their expenses, ordered by start date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_budgets(user_id: UserID, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let budgets: Vec<Budget> = connection
        .prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budget WHERE user_id = ?1 ORDER BY start_date ASC, id ASC"
        ))?
        .query_map([user_id.as_i64()], map_budget_row)?
        .collect::<Result<_, _>>()?;

    budgets
        .into_iter()
        .map(|mut budget| {
            budget.expenses = get_budget_expenses(budget.id, connection)?;
            Ok(budget)
        })
        .collect()
}

/// Replace the fields of a budget.
///
/// Transactions assigned to the budget that fall outside the new date range
/// are unassigned.
///
/// # Errors
/// This function will return a:
/// - validation error from [BudgetRequest::validate],
/// - [Error::NotFound] if `id` does not refer to a budget owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_budget(
    user_id: UserID,
    id: BudgetId,
    request: &BudgetRequest,
    connection: &Connection,
) -> Result<Budget, Error> {
    request.validate()?;

    let mut budget = connection
        .prepare(&format!(
            "UPDATE budget
             SET name = ?1, description = ?2, amount = ?3, start_date = ?4, end_date = ?5, updated = ?6
             WHERE id = ?7 AND user_id = ?8
             RETURNING {BUDGET_COLUMNS}"
        ))?
        .query_row(
            (
                &request.name,
                &request.description,
                request.amount,
                request.start_date,
                request.end_date,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_budget_row,
        )?;

    let unassigned = unassign_outside_range(user_id, id, budget.range(), connection)?;
    if unassigned > 0 {
        tracing::debug!("Unassigned {unassigned} transactions from budget {id}");
    }

    budget.expenses = get_budget_expenses(id, connection)?;

    Ok(budget)
}

/// Delete a budget.
///
/// Its transactions are unassigned and its expenses are deleted first.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a budget owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_budget(user_id: UserID, id: BudgetId, connection: &Connection) -> Result<(), Error> {
    // Checks ownership before anything is touched.
    get_budget(user_id, id, connection)?;

    connection.execute(
        "UPDATE \"transaction\" SET budget_id = NULL, updated = ?1 WHERE budget_id = ?2 AND user_id = ?3",
        (OffsetDateTime::now_utc(), id, user_id.as_i64()),
    )?;
    connection.execute("DELETE FROM budget_expense WHERE budget_id = ?1", [id])?;

    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Create the budget table in the database.
///
/// Must run after the user table exists.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            amount REAL NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            created TEXT NOT NULL,
            updated TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Budget] without its expenses.
fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        created: row.get(7)?,
        updated: row.get(8)?,
        expenses: Vec::new(),
    })
}
