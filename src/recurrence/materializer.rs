//! Turns a recurrence rule into concrete, dated transactions.

use crate::{
    Error,
    recurrence::{
        date_cursor::DateRange, expander::expand, models::RecurrenceRule, store::RecurrenceStore,
    },
    transaction::{Transaction, TransactionBuilder},
};

/// The unsaved occurrences of `rule` dated inside `window`, in date order.
///
/// Each occurrence copies the rule's template and refers back to the rule.
pub fn occurrences_in(
    rule: &RecurrenceRule,
    window: DateRange,
) -> impl Iterator<Item = TransactionBuilder> + '_ {
    expand(&rule.schedule, window).map(move |date| {
        TransactionBuilder::from_template(&rule.template, date).recurrence_id(Some(rule.id))
    })
}

/// Persist an occurrence for every date of the rule's lifetime.
///
/// Occurrences are inserted one at a time. The first failure stops the batch
/// and is returned; occurrences inserted before it are kept.
///
/// # Errors
/// Returns the first error reported by `store`.
pub fn materialize(
    store: &impl RecurrenceStore,
    rule: &RecurrenceRule,
) -> Result<Vec<Transaction>, Error> {
    persist(store, rule, occurrences_in(rule, rule.schedule.lifetime()))
}

/// Persist `occurrences` of `rule` in order, stopping at the first failure.
pub(super) fn persist(
    store: &impl RecurrenceStore,
    rule: &RecurrenceRule,
    occurrences: impl IntoIterator<Item = TransactionBuilder>,
) -> Result<Vec<Transaction>, Error> {
    occurrences
        .into_iter()
        .map(|occurrence| {
            store
                .insert_occurrence(rule.user_id, occurrence)
                .inspect_err(|error| {
                    tracing::error!(
                        "Could not insert occurrence of recurring transaction {}: {error}",
                        rule.id
                    )
                })
        })
        .collect()
}

#[cfg(test)]
mod materializer_tests {
    use time::{Date, macros::date};

    use crate::{
        Error,
        recurrence::{
            materializer::{materialize, occurrences_in},
            models::{Interval, Schedule, Template},
            sqlite::SQLiteRecurrenceStore,
            store::RecurrenceStore,
            test_store::FailingStore,
        },
        test_utils::{create_test_user, get_test_connection},
    };

    fn rent_schedule() -> Schedule {
        Schedule::new(date!(2024 - 01 - 01), date!(2024 - 04 - 01), Interval::Monthly).unwrap()
    }

    fn rent() -> Template {
        Template::new(-100.0, "Rent", "Rent").unwrap()
    }

    #[test]
    fn occurrences_copy_template_and_rule_id() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let rule = store.insert_rule(user_id, &rent_schedule(), &rent()).unwrap();

        let occurrences: Vec<_> = occurrences_in(&rule, rule.schedule.lifetime()).collect();

        assert_eq!(occurrences.len(), 3);
        for occurrence in occurrences {
            assert_eq!(occurrence.amount, -100.0);
            assert_eq!(occurrence.description, "Rent");
            assert_eq!(occurrence.category, "Rent");
            assert_eq!(occurrence.recurrence_id, Some(rule.id));
        }
    }

    #[test]
    fn materialize_persists_whole_lifetime() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let rule = store.insert_rule(user_id, &rent_schedule(), &rent()).unwrap();

        let created = materialize(&store, &rule).unwrap();

        let stored = store.list_occurrences_for_rule(user_id, rule.id).unwrap();
        assert_eq!(created, stored);
        assert_eq!(
            stored.iter().map(|occurrence| occurrence.date).collect::<Vec<_>>(),
            vec![date!(2024 - 01 - 01), date!(2024 - 02 - 01), date!(2024 - 03 - 01)]
        );
    }

    #[test]
    fn materialize_is_deterministic() {
        let first_conn = get_test_connection();
        let second_conn = get_test_connection();
        let dates = |conn: &rusqlite::Connection| -> Vec<Date> {
            let user_id = create_test_user(conn);
            let store = SQLiteRecurrenceStore::new(conn);
            let schedule =
                Schedule::new(date!(2024 - 01 - 31), date!(2025 - 01 - 01), Interval::Monthly)
                    .unwrap();
            let rule = store.insert_rule(user_id, &schedule, &rent()).unwrap();

            materialize(&store, &rule)
                .unwrap()
                .iter()
                .map(|occurrence| occurrence.date)
                .collect()
        };

        assert_eq!(dates(&first_conn), dates(&second_conn));
    }

    #[test]
    fn failure_aborts_batch_without_rollback() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = FailingStore::new(SQLiteRecurrenceStore::new(&conn), 2);
        let rule = store.insert_rule(user_id, &rent_schedule(), &rent()).unwrap();

        let result = materialize(&store, &rule);

        assert_eq!(result, Err(Error::DatabaseLockError));
        assert_eq!(
            store.list_occurrences_for_rule(user_id, rule.id).unwrap().len(),
            2,
            "occurrences inserted before the failure should be kept"
        );
        assert_eq!(store.insert_attempts(), 3, "no inserts after the failure");
    }
}
