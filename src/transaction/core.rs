//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    BudgetId, Error, RecurrenceId, TransactionId, UserID,
    recurrence::{DateRange, Template},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Transactions generated by a recurring transaction carry the ID of the
/// recurrence rule that owns them.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that owns the transaction.
    pub user_id: UserID,
    /// The recurrence rule that generated this transaction, if any.
    #[serde(rename = "recurringTransactionId")]
    pub recurrence_id: Option<RecurrenceId>,
    /// The budget this transaction has been assigned to, if any.
    pub budget_id: Option<BudgetId>,
    /// The amount of money spent or earned in this transaction.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The transaction type, e.g. "Salary" or "Groceries".
    #[serde(rename = "type")]
    pub category: String,
    /// When the transaction was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// When the transaction was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(amount: f64, date: Date, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            date,
            description: description.to_owned(),
            category: String::new(),
            recurrence_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// # Examples
///
/// ```ignore
/// use time::macros::date;
///
/// use crate::transaction::Transaction;
///
/// let rent = Transaction::build(-450.0, date!(2025 - 01 - 15), "Rent")
///     .category("Rent")
///     .recurrence_id(Some(3));
/// ```
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction.
    ///
    /// Positive values represent income, negative values represent expenses.
    pub amount: f64,

    /// The date when the transaction occurred.
    pub date: Date,

    /// A human-readable description of the transaction.
    pub description: String,

    /// The transaction type, e.g. "Salary" or "Groceries".
    pub category: String,

    /// The recurrence rule that generated the transaction.
    ///
    /// - `Some(id)` - one occurrence of a recurring transaction
    /// - `None` - a one-off transaction
    pub recurrence_id: Option<RecurrenceId>,
}

impl TransactionBuilder {
    /// Set the transaction type.
    pub fn category(mut self, category: &str) -> Self {
        category.clone_into(&mut self.category);
        self
    }

    /// Set the recurrence rule that generated the transaction.
    pub fn recurrence_id(mut self, recurrence_id: Option<RecurrenceId>) -> Self {
        self.recurrence_id = recurrence_id;
        self
    }

    /// Copy the amount, description and type from `template`.
    pub fn from_template(template: &Template, date: Date) -> Self {
        Transaction::build(template.amount, date, &template.description).category(&template.category)
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, user_id, recurring_transaction_id, budget_id, amount, date, \
     description, category, created, updated";

/// Create a new transaction for `user_id` in the database from a builder.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidForeignKey] if the user or recurrence rule does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let now = OffsetDateTime::now_utc();

    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
                (user_id, recurring_transaction_id, amount, date, description, category, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                user_id.as_i64(),
                builder.recurrence_id,
                builder.amount,
                builder.date,
                builder.description,
                builder.category,
                now,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transactions of `user_id` dated inside `range`, ordered by date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_transactions_in_range(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND date >= ?2 AND date < ?3
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id.as_i64(), range.start, range.end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the transactions of `user_id` inside `range` that are not assigned to a budget.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_unassigned_transactions(
    user_id: UserID,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND budget_id IS NULL AND date >= ?2 AND date < ?3
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id.as_i64(), range.start, range.end), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Retrieve every occurrence of the recurrence rule `recurrence_id`, ordered by date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn get_recurrence_occurrences(
    user_id: UserID,
    recurrence_id: RecurrenceId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
             WHERE user_id = ?1 AND recurring_transaction_id = ?2
             ORDER BY date ASC, id ASC"
        ))?
        .query_map((user_id.as_i64(), recurrence_id), map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

/// Replace the amount, date, description and type of a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    user_id: UserID,
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET amount = ?1, date = ?2, description = ?3, category = ?4, updated = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.amount,
                builder.date,
                builder.description,
                builder.category,
                OffsetDateTime::now_utc(),
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Copy the amount, description and type of `template` into a transaction, keeping its date.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction_fields(
    user_id: UserID,
    id: TransactionId,
    template: &Template,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET amount = ?1, description = ?2, category = ?3, updated = ?4
         WHERE id = ?5 AND user_id = ?6",
        (
            template.amount,
            &template.description,
            &template.category,
            OffsetDateTime::now_utc(),
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Assign a transaction to a budget, or unassign it with `None`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn set_transaction_budget(
    user_id: UserID,
    id: TransactionId,
    budget_id: Option<BudgetId>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET budget_id = ?1, updated = ?2 WHERE id = ?3 AND user_id = ?4",
        (budget_id, OffsetDateTime::now_utc(), id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

type RowsAffected = usize;

/// Delete a single transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by the user,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    user_id: UserID,
    id: TransactionId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete every occurrence of a recurrence rule.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_recurrence_occurrences(
    user_id: UserID,
    recurrence_id: RecurrenceId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE user_id = ?1 AND recurring_transaction_id = ?2",
            (user_id.as_i64(), recurrence_id),
        )
        .map_err(|error| error.into())
}

/// Delete the occurrences of a recurrence rule dated on or after `date`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn delete_recurrence_occurrences_from(
    user_id: UserID,
    recurrence_id: RecurrenceId,
    date: Date,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\"
             WHERE user_id = ?1 AND recurring_transaction_id = ?2 AND date >= ?3",
            (user_id.as_i64(), recurrence_id, date),
        )
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
///
/// Must run after the user, budget and recurring transaction tables exist.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                recurring_transaction_id INTEGER,
                budget_id INTEGER,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(recurring_transaction_id) REFERENCES recurring_transaction(id),
                FOREIGN KEY(budget_id) REFERENCES budget(id) ON DELETE SET NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_recurrence
         ON \"transaction\"(recurring_transaction_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let recurrence_id = row.get(2)?;
    let budget_id = row.get(3)?;
    let amount = row.get(4)?;
    let date = row.get(5)?;
    let description = row.get(6)?;
    let category = row.get(7)?;
    let created = row.get(8)?;
    let updated = row.get(9)?;

    Ok(Transaction {
        id,
        user_id,
        recurrence_id,
        budget_id,
        amount,
        date,
        description,
        category,
        created,
        updated,
    })
}

// ============================================================================
// TESTS
// ============================================================================
