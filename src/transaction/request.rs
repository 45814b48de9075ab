//! The JSON bodies accepted and returned by the transaction endpoints.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error, RecurrenceId,
    recurrence::{Interval, IntervalKind, RecurrenceRule, Schedule, Template},
    transaction::{Transaction, TransactionBuilder},
};

/// The body for creating or updating a transaction.
///
/// One-off transactions need `date`. Recurring transactions need
/// `startDate`, `endDate` and `interval`, plus `daysInterval` for custom
/// intervals.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    /// Positive for income, negative for expenses.
    pub amount: f64,
    /// What the transaction is for.
    pub description: String,
    /// The transaction type, e.g. "Salary".
    #[serde(rename = "type")]
    pub category: String,
    /// Whether this is a recurring transaction.
    #[serde(default)]
    pub recurring: bool,
    /// The date of a one-off transaction.
    pub date: Option<Date>,
    /// The first date of a recurring transaction.
    pub start_date: Option<Date>,
    /// The exclusive end date of a recurring transaction.
    pub end_date: Option<Date>,
    /// How often a recurring transaction happens.
    pub interval: Option<IntervalKind>,
    /// The day count of a custom interval.
    pub days_interval: Option<u32>,
}

/// A validated [TransactionRequest].
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionDraft {
    /// A single transaction on a fixed date.
    OneOff(TransactionBuilder),
    /// A recurring transaction.
    Recurring(Schedule, Template),
}

impl TransactionRequest {
    /// Validate the request.
    ///
    /// # Errors
    /// Returns [Error::InvalidTransaction] if the amount, description, type or
    /// date is invalid, or [Error::InvalidRecurrence] if the schedule is.
    pub fn into_draft(self) -> Result<TransactionDraft, Error> {
        let template = Template::new(self.amount, &self.description, &self.category)?;

        if !self.recurring {
            let date = self.date.ok_or_else(|| {
                Error::InvalidTransaction("a one-off transaction needs a date".to_owned())
            })?;

            return Ok(TransactionDraft::OneOff(TransactionBuilder::from_template(
                &template, date,
            )));
        }

        let (Some(start), Some(end), Some(kind)) = (self.start_date, self.end_date, self.interval)
        else {
            return Err(Error::InvalidRecurrence(
                "a recurring transaction needs a start date, end date and interval".to_owned(),
            ));
        };
        let interval = Interval::from_parts(kind, self.days_interval)?;
        let schedule = Schedule::new(start, end, interval)?;

        Ok(TransactionDraft::Recurring(schedule, template))
    }

    /// Validate a request that must describe a recurring transaction.
    ///
    /// # Errors
    /// See [TransactionRequest::into_draft]. A one-off request is an
    /// [Error::InvalidRecurrence].
    pub fn into_recurring(self) -> Result<(Schedule, Template), Error> {
        match self.into_draft()? {
            TransactionDraft::Recurring(schedule, template) => Ok((schedule, template)),
            TransactionDraft::OneOff(_) => Err(Error::InvalidRecurrence(
                "expected a recurring transaction".to_owned(),
            )),
        }
    }
}

/// A recurrence rule as sent to the frontend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransaction {
    /// The ID of the rule.
    pub id: RecurrenceId,
    /// The first occurrence date.
    pub start_date: Date,
    /// The exclusive end date.
    pub end_date: Date,
    /// How often the transaction happens.
    pub interval: IntervalKind,
    /// The day count of a custom interval.
    pub days_interval: Option<u32>,
    /// The amount of each occurrence.
    pub amount: f64,
    /// The description of each occurrence.
    pub description: String,
    /// The type of each occurrence.
    #[serde(rename = "type")]
    pub category: String,
    /// When the rule was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// When the rule was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

impl From<&RecurrenceRule> for RecurringTransaction {
    fn from(rule: &RecurrenceRule) -> Self {
        Self {
            id: rule.id,
            start_date: rule.schedule.start,
            end_date: rule.schedule.end,
            interval: rule.schedule.interval.kind(),
            days_interval: rule.schedule.interval.days_interval(),
            amount: rule.template.amount,
            description: rule.template.description.clone(),
            category: rule.template.category.clone(),
            created: rule.created,
            updated: rule.updated,
        }
    }
}

/// A recurring transaction and its occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTransactionWithOccurrences {
    /// The rule.
    pub recurring_transaction: RecurringTransaction,
    /// The rule's occurrences in date order.
    pub occurrences: Vec<Transaction>,
}
