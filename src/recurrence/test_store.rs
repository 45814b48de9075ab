#![allow(missing_docs)]

use std::cell::Cell;

use time::Date;

use crate::{
    Error, RecurrenceId, TransactionId, UserID,
    recurrence::{
        models::{RecurrenceRule, Schedule, Template},
        store::RecurrenceStore,
    },
    transaction::{Transaction, TransactionBuilder},
};

/// Wraps a store and fails every occurrence insert after the first `successful_inserts`.
pub(crate) struct FailingStore<S> {
    inner: S,
    successful_inserts: usize,
    attempts: Cell<usize>,
}

impl<S: RecurrenceStore> FailingStore<S> {
    pub(crate) fn new(inner: S, successful_inserts: usize) -> Self {
        Self {
            inner,
            successful_inserts,
            attempts: Cell::new(0),
        }
    }

    pub(crate) fn insert_attempts(&self) -> usize {
        self.attempts.get()
    }
}

impl<S: RecurrenceStore> RecurrenceStore for FailingStore<S> {
    fn insert_occurrence(
        &self,
        user_id: UserID,
        occurrence: TransactionBuilder,
    ) -> Result<Transaction, Error> {
        let attempt = self.attempts.get();
        self.attempts.set(attempt + 1);

        if attempt >= self.successful_inserts {
            return Err(Error::DatabaseLockError);
        }

        self.inner.insert_occurrence(user_id, occurrence)
    }

    fn delete_occurrences_for_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
    ) -> Result<usize, Error> {
        self.inner.delete_occurrences_for_rule(user_id, rule_id)
    }

    fn delete_occurrences_on_or_after(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
        date: Date,
    ) -> Result<usize, Error> {
        self.inner
            .delete_occurrences_on_or_after(user_id, rule_id, date)
    }

    fn update_occurrence_fields(
        &self,
        user_id: UserID,
        occurrence_id: TransactionId,
        template: &Template,
    ) -> Result<(), Error> {
        self.inner
            .update_occurrence_fields(user_id, occurrence_id, template)
    }

    fn list_occurrences_for_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
    ) -> Result<Vec<Transaction>, Error> {
        self.inner.list_occurrences_for_rule(user_id, rule_id)
    }

    fn get_rule(&self, user_id: UserID, rule_id: RecurrenceId) -> Result<RecurrenceRule, Error> {
        self.inner.get_rule(user_id, rule_id)
    }

    fn insert_rule(
        &self,
        user_id: UserID,
        schedule: &Schedule,
        template: &Template,
    ) -> Result<RecurrenceRule, Error> {
        self.inner.insert_rule(user_id, schedule, template)
    }

    fn update_rule(
        &self,
        user_id: UserID,
        rule_id: RecurrenceId,
        schedule: &Schedule,
        template: &Template,
    ) -> Result<RecurrenceRule, Error> {
        self.inner.update_rule(user_id, rule_id, schedule, template)
    }

    fn delete_rule(&self, user_id: UserID, rule_id: RecurrenceId) -> Result<(), Error> {
        self.inner.delete_rule(user_id, rule_id)
    }
}
