//! Recurring transactions.
//!
//! A recurring transaction is stored as a [RecurrenceRule]: a [Schedule]
//! saying when it happens and a [Template] saying what each occurrence looks
//! like. Every date of the rule's lifetime is materialized as an ordinary
//! transaction that refers back to the rule, so reports and budgets never
//! need to expand rules on the fly.
//!
//! - [expand] lists the dates of a schedule inside a window.
//! - [materialize] persists the occurrences of a new rule.
//! - [update_recurring] reconciles stored occurrences after an edit.
//!
//! Storage goes through [RecurrenceStore], which [SQLiteRecurrenceStore]
//! implements on top of the transaction table.

mod date_cursor;
mod expander;
mod materializer;
mod models;
mod reconciler;
mod sqlite;
mod store;

#[cfg(test)]
mod test_store;

pub use date_cursor::{
    DateRange, add_days, add_months, add_weeks, days_between, days_in_month, month_window,
    months_between, year_window,
};
pub use expander::{ScheduleDates, expand, nth_date};
pub use materializer::{materialize, occurrences_in};
pub use models::{
    Interval, IntervalKind, MAX_DESCRIPTION_LENGTH, RecurrenceRule, Schedule, Template,
};
pub use reconciler::{
    Reconciliation, ScheduleChange, classify, create_recurring, delete_recurring,
    update_recurring,
};
pub use sqlite::{SQLiteRecurrenceStore, create_recurrence_table};
pub use store::RecurrenceStore;
