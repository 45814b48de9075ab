//! The SQLite implementation of [RecurrenceStore] and the recurring transaction table.

use rusqlite::{Connection, Row};
use time::{Date, OffsetDateTime};

use crate::{
    Error, RecurrenceId, TransactionId, UserID,
    recurrence::{
        models::{Interval, IntervalKind, RecurrenceRule, Schedule, Template},
        store::RecurrenceStore,
    },
    transaction::{
        Transaction, TransactionBuilder, create_transaction, delete_recurrence_occurrences,
        delete_recurrence_occurrences_from, get_recurrence_occurrences, update_transaction_fields,
    },
};

/// Stores recurrence rules and their occurrences in a SQLite database.
///
/// The store borrows a connection so that a request handler can lock the
/// shared connection once and run a whole reconciliation under that lock.
#[derive(Debug, Clone, Copy)]
pub struct SQLiteRecurrenceStore<'a> {
    connection: &'a Connection,
}

impl<'a> SQLiteRecurrenceStore<'a> {
    /// Create a store that runs its queries on `connection`.
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

const RULE_COLUMNS: &str = "id, user_id, start_date, end_date, interval, days_interval, amount, \
     description, category, created, updated";

impl RecurrenceStore for SQLiteRecurrenceStore<'_> {
    fn insert_occurrence(
        &self,
        user_id: UserID,
        occurrence: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        create_transaction(user_id, occurrence, self.connection)
    }

    fn delete_occurrences_for_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
    ) -> Result<usize, Error> {
        delete_recurrence_occurrences(user_id, rule_id, self.connection)
    }

    fn delete_occurrences_on_or_after(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
        date: Date,
    ) -> Result<usize, Error> {
        delete_recurrence_occurrences_from(user_id, rule_id, date, self.connection)
    }

    fn update_occurrence_fields(
        &self,
        user_id: UserID,
        occurrence_id: TransactionId,
        template: &Template,
    ) -> Result<(), Error> {
        update_transaction_fields(user_id, occurrence_id, template, self.connection)
    }

    fn list_occurrences_for_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
    ) -> Result<Vec<Transaction>, Error> {
        get_recurrence_occurrences(user_id, rule_id, self.connection)
    }

    fn get_rule(&self, user_id: UserID, rule_id: RecurrenceId) -> Result<RecurrenceRule, Error> {
        self.connection
            .prepare(&format!(
                "SELECT {RULE_COLUMNS} FROM recurring_transaction WHERE id = ?1 AND user_id = ?2"
            ))?
            .query_row((rule_id, user_id.as_i64()), map_rule_row)
            .map_err(|error| error.into())
    }

    fn insert_rule(
        &self,
        user_id: UserID,
        schedule: &Schedule,
        template: &Template,
    ) -> Result<RecurrenceRule, Error> {
        self.connection
            .prepare(&format!(
                "INSERT INTO recurring_transaction
                    (user_id, start_date, end_date, interval, days_interval, amount, description,
                     category, created, updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                 RETURNING {RULE_COLUMNS}"
            ))?
            .query_row(
                (
                    user_id.as_i64(),
                    schedule.start,
                    schedule.end,
                    schedule.interval.kind(),
                    schedule.interval.days_interval(),
                    template.amount,
                    &template.description,
                    &template.category,
                    OffsetDateTime::now_utc(),
                ),
                map_rule_row,
            )
            .map_err(|error| error.into())
    }

    fn update_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
        schedule: &Schedule,
        template: &Template,
    ) -> Result<RecurrenceRule, Error> {
        self.connection
            .prepare(&format!(
                "UPDATE recurring_transaction
                 SET start_date = ?1, end_date = ?2, interval = ?3, days_interval = ?4,
                     amount = ?5, description = ?6, category = ?7, updated = ?8
                 WHERE id = ?9 AND user_id = ?10
                 RETURNING {RULE_COLUMNS}"
            ))?
            .query_row(
                (
                    schedule.start,
                    schedule.end,
                    schedule.interval.kind(),
                    schedule.interval.days_interval(),
                    template.amount,
                    &template.description,
                    &template.category,
                    OffsetDateTime::now_utc(),
                    rule_id,
                    user_id.as_i64(),
                ),
                map_rule_row,
            )
            .map_err(|error| error.into())
    }

    fn delete_rule(&self, user_id: UserID, rule_id: RecurrenceId) -> Result<(), Error> {
        let rows_affected = self.connection.execute(
            "DELETE FROM recurring_transaction WHERE id = ?1 AND user_id = ?2",
            (rule_id, user_id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

/// Create the table for recurrence rules.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_recurrence_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_transaction (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                interval TEXT NOT NULL,
                days_interval INTEGER,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn map_rule_row(row: &Row) -> Result<RecurrenceRule, rusqlite::Error> {
    let kind: IntervalKind = row.get(4)?;
    let days_interval: Option<u32> = row.get(5)?;

    Ok(RecurrenceRule {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        schedule: Schedule {
            start: row.get(2)?,
            end: row.get(3)?,
            interval: Interval::from_stored(kind, days_interval),
        },
        template: Template {
            amount: row.get(6)?,
            description: row.get(7)?,
            category: row.get(8)?,
        },
        created: row.get(9)?,
        updated: row.get(10)?,
    })
}
