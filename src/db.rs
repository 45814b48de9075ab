//! Sets up the application's SQLite database.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    budget::{create_budget_expense_table, create_budget_table},
    recurrence::create_recurrence_table,
    transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the tables for the domain models if they do not exist.
///
/// Tables are created in dependency order inside a single exclusive
/// transaction, so a half-initialized database is never left behind.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_recurrence_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
