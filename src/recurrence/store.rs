//! Defines the store used by the materializer and reconciler.

use time::Date;

use crate::{
    Error, RecurrenceId, TransactionId, UserID,
    recurrence::models::{RecurrenceRule, Schedule, Template},
    transaction::{Transaction, TransactionBuilder},
};

type RowsAffected = usize;

/// Handles the persistence of recurrence rules and their occurrences.
///
/// Every method is scoped to `user_id`: rules and occurrences owned by
/// another user behave as if they do not exist.
///
/// Each call is its own unit of work. Implementations are not expected to
/// roll back earlier calls when a later one fails.
pub trait RecurrenceStore {
    /// Persist one occurrence.
    fn insert_occurrence(
        &self,
        user_id: UserID,
        occurrence: TransactionBuilder,
    ) -> Result<Transaction, Error>;

    /// Delete every occurrence of a rule.
    fn delete_occurrences_for_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
    ) -> Result<RowsAffected, Error>;

    /// Delete the occurrences of a rule dated on or after `date`.
    fn delete_occurrences_on_or_after(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
        date: Date,
    ) -> Result<RowsAffected, Error>;

    /// Copy the amount, description and type of `template` into an occurrence.
    fn update_occurrence_fields(
        &self,
        user_id: UserID,
        occurrence_id: TransactionId,
        template: &Template,
    ) -> Result<(), Error>;

    /// Every occurrence of a rule in ascending date order.
    fn list_occurrences_for_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
    ) -> Result<Vec<Transaction>, Error>;

    /// Retrieve a rule.
    ///
    /// Returns [Error::NotFound] if the rule does not exist.
    fn get_rule(&self, user_id: UserID, rule_id: RecurrenceId) -> Result<RecurrenceRule, Error>;

    /// Persist a new rule.
    fn insert_rule(
        &self,
        user_id: UserID,
        schedule: &Schedule,
        template: &Template,
    ) -> Result<RecurrenceRule, Error>;

    /// Replace the schedule and template of a rule.
    ///
    /// Returns [Error::NotFound] if the rule does not exist.
    fn update_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
        schedule: &Schedule,
        template: &Template,
    ) -> Result<RecurrenceRule, Error>;

    /// Delete a rule. Its occurrences must already have been deleted.
    ///
    /// Returns [Error::NotFound] if the rule does not exist.
    fn delete_rule(&self, user_id: UserID, rule_id: RecurrenceId) -> Result<(), Error>;
}
