//! Creates, updates and deletes recurring transactions.
//!
//! Updating a rule brings its stored occurrences in line with the new
//! schedule and template while touching as few rows as possible:
//!
//! 1. If the grid moved (start date or interval changed), every occurrence
//!    is deleted and the rule is materialized again.
//! 2. Otherwise, if the end date moved later, the missing tail is appended.
//! 3. Otherwise, if the end date moved earlier, the occurrences on or after
//!    the new end date are deleted.
//! 4. If the grid did not move and the amount, description or type changed,
//!    the surviving occurrences are patched in place.
//! 5. The rule itself is saved last.
//!
//! A failure at any step is returned immediately. Changes made by earlier
//! steps are not rolled back, and the rule keeps its old values.

use serde::Serialize;
use time::Date;

use crate::{
    Error, RecurrenceId, UserID,
    recurrence::{
        date_cursor::DateRange,
        materializer::{materialize, occurrences_in, persist},
        models::{RecurrenceRule, Schedule, Template},
        store::RecurrenceStore,
    },
    transaction::Transaction,
};

/// How a schedule edit affects the stored occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScheduleChange {
    /// The start date or interval changed, every occurrence is replaced.
    Regenerate,
    /// The end date moved later, occurrences are appended.
    ExtendTail,
    /// The end date moved earlier, trailing occurrences are deleted.
    TruncateTail,
    /// The dates of the occurrences are unaffected.
    Unchanged,
}

/// Decide how moving from `old` to `new` affects the stored occurrences.
///
/// A change of grid takes priority over any change of end date.
pub fn classify(old: &Schedule, new: &Schedule) -> ScheduleChange {
    if new.interval != old.interval || new.start != old.start {
        ScheduleChange::Regenerate
    } else if new.end > old.end {
        ScheduleChange::ExtendTail
    } else if new.end < old.end {
        ScheduleChange::TruncateTail
    } else {
        ScheduleChange::Unchanged
    }
}

/// What an update did to a rule and its occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// The rule as saved.
    pub rule: RecurrenceRule,
    /// How the schedule edit was classified.
    pub change: ScheduleChange,
    /// The number of occurrences inserted.
    pub inserted: usize,
    /// The number of occurrences deleted.
    pub deleted: usize,
    /// The number of occurrences whose amount, description or type was patched.
    pub patched: usize,
}

/// Create a recurring transaction and every occurrence of its lifetime.
///
/// Returns the saved rule and its occurrences in date order.
///
/// # Errors
/// - [Error::InvalidRecurrence] or [Error::InvalidTransaction] if the schedule
///   or template is invalid. Nothing is saved in this case.
/// - Any error from `store`. See [materialize] for what is kept on failure.
pub fn create_recurring(
    store: &impl RecurrenceStore,
    user_id: UserID,
    schedule: &Schedule,
    template: &Template,
) -> Result<(RecurrenceRule, Vec<Transaction>), Error> {
    schedule.validate()?;
    template.validate()?;

    let rule = store.insert_rule(user_id, schedule, template)?;
    let occurrences = materialize(store, &rule)?;

    tracing::info!(
        "Created recurring transaction {} with {} occurrences",
        rule.id,
        occurrences.len()
    );

    Ok((rule, occurrences))
}

/// Replace the schedule and template of a recurring transaction and
/// reconcile its stored occurrences.
///
/// # Errors
/// - [Error::InvalidRecurrence] or [Error::InvalidTransaction] if the schedule
///   or template is invalid. Nothing is changed in this case.
/// - [Error::NotFound] if the rule does not exist or belongs to another user.
/// - Any error from `store`, see the [module docs](self) for what is kept on failure.
pub fn update_recurring(
    store: &impl RecurrenceStore,
    user_id: UserID,
    rule_id: RecurrenceId,
    schedule: &Schedule,
    template: &Template,
) -> Result<Reconciliation, Error> {
    schedule.validate()?;
    template.validate()?;

    let old = store.get_rule(user_id, rule_id)?;
    let change = classify(&old.schedule, schedule);
    tracing::info!("Reconciling recurring transaction {rule_id}: {change:?}");

    let new = RecurrenceRule {
        schedule: *schedule,
        template: template.clone(),
        ..old.clone()
    };

    let mut inserted = 0;
    let mut deleted = 0;

    // The occurrences that were stored before this update and still exist.
    let surviving = match change {
        ScheduleChange::Regenerate => {
            deleted = store.delete_occurrences_for_rule(user_id, rule_id)?;
            inserted = materialize(store, &new)?.len();
            Vec::new()
        }
        ScheduleChange::ExtendTail => {
            let existing = store.list_occurrences_for_rule(user_id, rule_id)?;
            inserted = extend_tail(store, &new, last_date(&existing))?.len();
            existing
        }
        ScheduleChange::TruncateTail => {
            let mut existing = store.list_occurrences_for_rule(user_id, rule_id)?;
            let keep = truncation_point(&existing, schedule.end);

            if keep < existing.len() {
                deleted = store.delete_occurrences_on_or_after(user_id, rule_id, schedule.end)?;
                existing.truncate(keep);
            }

            existing
        }
        ScheduleChange::Unchanged => store.list_occurrences_for_rule(user_id, rule_id)?,
    };

    let mut patched = 0;
    if change != ScheduleChange::Regenerate && *template != old.template {
        for occurrence in &surviving {
            store.update_occurrence_fields(user_id, occurrence.id, template)?;
            patched += 1;
        }
    }

    tracing::debug!(
        "Recurring transaction {rule_id}: inserted {inserted}, deleted {deleted}, patched {patched}"
    );

    let rule = store.update_rule(user_id, rule_id, schedule, template)?;

    Ok(Reconciliation {
        rule,
        change,
        inserted,
        deleted,
        patched,
    })
}

/// Delete a recurring transaction, its occurrences first.
///
/// Returns the number of occurrences deleted.
///
/// # Errors
/// - [Error::NotFound] if the rule does not exist or belongs to another user.
/// - Any error from `store`.
pub fn delete_recurring(
    store: &impl RecurrenceStore,
    user_id: UserID,
    rule_id: RecurrenceId,
) -> Result<usize, Error> {
    store.get_rule(user_id, rule_id)?;

    let deleted = store.delete_occurrences_for_rule(user_id, rule_id)?;
    store.delete_rule(user_id, rule_id)?;

    tracing::info!("Deleted recurring transaction {rule_id} and {deleted} occurrences");

    Ok(deleted)
}

fn last_date(occurrences: &[Transaction]) -> Option<Date> {
    occurrences.last().map(|occurrence| occurrence.date)
}

/// Append the occurrences of `rule` after `last_existing`.
///
/// Expansion starts at the last existing occurrence rather than the rule
/// start. That first date already exists and is skipped. With no existing
/// occurrences, the whole lifetime is materialized.
fn extend_tail(
    store: &impl RecurrenceStore,
    rule: &RecurrenceRule,
    last_existing: Option<Date>,
) -> Result<Vec<Transaction>, Error> {
    let from = last_existing.unwrap_or(rule.schedule.start);
    let window = DateRange::new(from, rule.schedule.end);

    let missing = occurrences_in(rule, window)
        .filter(|occurrence| last_existing.is_none_or(|last| occurrence.date > last));

    persist(store, rule, missing)
}

/// The number of leading occurrences dated before `end`.
///
/// Occurrences are in date order, so the ones to delete are a suffix. The
/// scan starts at the most recent occurrence and stops at the first one
/// dated before `end`.
fn truncation_point(occurrences: &[Transaction], end: Date) -> usize {
    let suffix = occurrences
        .iter()
        .rev()
        .take_while(|occurrence| occurrence.date >= end)
        .count();

    occurrences.len() - suffix
}

#[cfg(test)]
mod reconciler_tests {
    use time::{Date, macros::date};

    use crate::{
        Error,
        recurrence::{
            expander::expand,
            models::{Interval, Schedule, Template},
            reconciler::{
                ScheduleChange, classify, create_recurring, delete_recurring, update_recurring,
            },
            sqlite::SQLiteRecurrenceStore,
            store::RecurrenceStore,
            test_store::FailingStore,
        },
        test_utils::{create_test_user, get_test_connection},
        transaction::{Transaction, get_transaction},
        user::UserID,
    };

    fn monthly(start: Date, end: Date) -> Schedule {
        Schedule::new(start, end, Interval::Monthly).unwrap()
    }

    fn rent() -> Template {
        Template::new(-100.0, "Rent", "Rent").unwrap()
    }

    fn dates(occurrences: &[Transaction]) -> Vec<Date> {
        occurrences.iter().map(|occurrence| occurrence.date).collect()
    }

    fn stored_dates(store: &impl RecurrenceStore, user_id: UserID, rule_id: i64) -> Vec<Date> {
        dates(&store.list_occurrences_for_rule(user_id, rule_id).unwrap())
    }

    #[test]
    fn classify_grid_change_wins() {
        let old = monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01));

        let moved_start = monthly(date!(2024 - 01 - 02), date!(2024 - 06 - 01));
        let new_interval =
            Schedule::new(old.start, date!(2024 - 02 - 01), Interval::Weekly).unwrap();

        assert_eq!(classify(&old, &moved_start), ScheduleChange::Regenerate);
        assert_eq!(classify(&old, &new_interval), ScheduleChange::Regenerate);
    }

    #[test]
    fn classify_custom_day_count_change_as_regenerate() {
        let old = Schedule::new(
            date!(2024 - 01 - 01),
            date!(2024 - 04 - 01),
            Interval::Custom(10),
        )
        .unwrap();
        let new = Schedule {
            interval: Interval::Custom(12),
            ..old
        };

        assert_eq!(classify(&old, &new), ScheduleChange::Regenerate);
    }

    #[test]
    fn classify_end_date_changes() {
        let old = monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01));

        assert_eq!(
            classify(&old, &monthly(old.start, date!(2024 - 06 - 01))),
            ScheduleChange::ExtendTail
        );
        assert_eq!(
            classify(&old, &monthly(old.start, date!(2024 - 03 - 01))),
            ScheduleChange::TruncateTail
        );
        assert_eq!(classify(&old, &old), ScheduleChange::Unchanged);
    }

    #[test]
    fn create_materializes_lifetime() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);

        let (rule, occurrences) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01)),
            &rent(),
        )
        .unwrap();

        assert_eq!(
            dates(&occurrences),
            vec![date!(2024 - 01 - 01), date!(2024 - 02 - 01), date!(2024 - 03 - 01)]
        );
        assert!(
            occurrences
                .iter()
                .all(|occurrence| occurrence.recurrence_id == Some(rule.id)
                    && occurrence.amount == -100.0)
        );
    }

    #[test]
    fn create_rejects_invalid_schedule_before_saving() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let schedule = Schedule {
            start: date!(2024 - 05 - 01),
            end: date!(2024 - 01 - 01),
            interval: Interval::Monthly,
        };

        let result = create_recurring(&store, user_id, &schedule, &rent());

        assert!(matches!(result, Err(Error::InvalidRecurrence(_))));
        let rule_count: i64 = conn
            .query_row("SELECT COUNT(id) FROM recurring_transaction", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(rule_count, 0);
    }

    #[test]
    fn extending_end_appends_missing_dates() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, original) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01)),
            &rent(),
        )
        .unwrap();
        let extended = monthly(date!(2024 - 01 - 01), date!(2024 - 06 - 01));

        let result = update_recurring(&store, user_id, rule.id, &extended, &rent()).unwrap();

        assert_eq!(result.change, ScheduleChange::ExtendTail);
        assert_eq!(result.inserted, 2);
        assert_eq!(result.deleted, 0);
        let stored = store.list_occurrences_for_rule(user_id, rule.id).unwrap();
        assert_eq!(
            dates(&stored),
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 02 - 01),
                date!(2024 - 03 - 01),
                date!(2024 - 04 - 01),
                date!(2024 - 05 - 01)
            ]
        );
        assert_eq!(&stored[..3], &original[..], "existing occurrences are kept");
        assert_eq!(result.rule.schedule, extended);
    }

    #[test]
    fn extending_matches_full_expansion_for_every_interval() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let start = date!(2024 - 01 - 31);

        for interval in [
            Interval::Daily,
            Interval::Weekly,
            Interval::Monthly,
            Interval::Custom(11),
        ] {
            let short = Schedule::new(start, date!(2024 - 03 - 15), interval).unwrap();
            let long = Schedule::new(start, date!(2024 - 07 - 02), interval).unwrap();
            let (rule, _) = create_recurring(&store, user_id, &short, &rent()).unwrap();

            update_recurring(&store, user_id, rule.id, &long, &rent()).unwrap();

            let want: Vec<Date> = expand(&long, long.lifetime()).collect();
            let got = stored_dates(&store, user_id, rule.id);
            assert_eq!(got, want, "extending a {interval:?} rule");
            let mut deduplicated = got.clone();
            deduplicated.dedup();
            assert_eq!(got, deduplicated, "no date should appear twice");
        }
    }

    #[test]
    fn extending_rule_without_occurrences_starts_at_rule_start() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, occurrences) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 01 - 01)),
            &rent(),
        )
        .unwrap();
        assert!(occurrences.is_empty());

        update_recurring(
            &store,
            user_id,
            rule.id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 03 - 01)),
            &rent(),
        )
        .unwrap();

        assert_eq!(
            stored_dates(&store, user_id, rule.id),
            vec![date!(2024 - 01 - 01), date!(2024 - 02 - 01)]
        );
    }

    #[test]
    fn truncating_end_deletes_suffix() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, _) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 06 - 01)),
            &rent(),
        )
        .unwrap();
        let truncated = monthly(date!(2024 - 01 - 01), date!(2024 - 03 - 01));

        let result = update_recurring(&store, user_id, rule.id, &truncated, &rent()).unwrap();

        assert_eq!(result.change, ScheduleChange::TruncateTail);
        assert_eq!(result.deleted, 3);
        assert_eq!(result.inserted, 0);
        assert_eq!(
            stored_dates(&store, user_id, rule.id),
            expand(&truncated, truncated.lifetime()).collect::<Vec<_>>()
        );
        assert_eq!(
            stored_dates(&store, user_id, rule.id),
            vec![date!(2024 - 01 - 01), date!(2024 - 02 - 01)]
        );
    }

    #[test]
    fn truncating_between_grid_points_deletes_nothing() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, _) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 03 - 20)),
            &rent(),
        )
        .unwrap();

        let result = update_recurring(
            &store,
            user_id,
            rule.id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 03 - 10)),
            &rent(),
        )
        .unwrap();

        assert_eq!(result.change, ScheduleChange::TruncateTail);
        assert_eq!(result.deleted, 0);
        assert_eq!(stored_dates(&store, user_id, rule.id).len(), 3);
    }

    #[test]
    fn field_patch_keeps_dates_and_ids() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let schedule = monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01));
        let (rule, before) = create_recurring(&store, user_id, &schedule, &rent()).unwrap();
        let raise = Template::new(-120.0, "Rent (new lease)", "Fixed").unwrap();

        let result = update_recurring(&store, user_id, rule.id, &schedule, &raise).unwrap();

        assert_eq!(result.change, ScheduleChange::Unchanged);
        assert_eq!(result.patched, 3);
        let after = store.list_occurrences_for_rule(user_id, rule.id).unwrap();
        assert_eq!(dates(&after), dates(&before));
        for (old, new) in before.iter().zip(&after) {
            assert_eq!(new.id, old.id);
            assert_eq!(new.amount, -120.0);
            assert_eq!(new.description, "Rent (new lease)");
            assert_eq!(new.category, "Fixed");
        }
        assert_eq!(result.rule.template, raise);
    }

    #[test]
    fn unchanged_rule_touches_no_occurrences() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let schedule = monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01));
        let (rule, before) = create_recurring(&store, user_id, &schedule, &rent()).unwrap();

        let result = update_recurring(&store, user_id, rule.id, &schedule, &rent()).unwrap();

        assert_eq!(
            (result.inserted, result.deleted, result.patched),
            (0, 0, 0)
        );
        assert_eq!(
            store.list_occurrences_for_rule(user_id, rule.id).unwrap(),
            before
        );
    }

    #[test]
    fn extend_with_new_amount_patches_old_and_appends_new() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, _) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 03 - 01)),
            &rent(),
        )
        .unwrap();
        let raise = Template::new(-150.0, "Rent", "Rent").unwrap();

        let result = update_recurring(
            &store,
            user_id,
            rule.id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 05 - 01)),
            &raise,
        )
        .unwrap();

        assert_eq!(result.change, ScheduleChange::ExtendTail);
        assert_eq!((result.inserted, result.patched), (2, 2));
        let stored = store.list_occurrences_for_rule(user_id, rule.id).unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|occurrence| occurrence.amount == -150.0));
    }

    #[test]
    fn moving_start_regenerates_everything() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, before) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01)),
            &rent(),
        )
        .unwrap();
        let moved = monthly(date!(2024 - 01 - 15), date!(2024 - 05 - 01));

        let result = update_recurring(&store, user_id, rule.id, &moved, &rent()).unwrap();

        assert_eq!(result.change, ScheduleChange::Regenerate);
        assert_eq!((result.deleted, result.inserted), (3, 4));
        let after = store.list_occurrences_for_rule(user_id, rule.id).unwrap();
        assert_eq!(
            dates(&after),
            vec![
                date!(2024 - 01 - 15),
                date!(2024 - 02 - 15),
                date!(2024 - 03 - 15),
                date!(2024 - 04 - 15)
            ]
        );
        for old in &before {
            assert_eq!(
                get_transaction(user_id, old.id, &conn),
                Err(Error::NotFound)
            );
        }
    }

    #[test]
    fn changing_interval_regenerates_with_new_template() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, _) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 02 - 01)),
            &rent(),
        )
        .unwrap();
        let weekly =
            Schedule::new(date!(2024 - 01 - 01), date!(2024 - 02 - 01), Interval::Weekly).unwrap();
        let allowance = Template::new(10.0, "Allowance", "Other").unwrap();

        let result = update_recurring(&store, user_id, rule.id, &weekly, &allowance).unwrap();

        assert_eq!(result.patched, 0);
        let stored = store.list_occurrences_for_rule(user_id, rule.id).unwrap();
        assert_eq!(stored.len(), 5);
        assert!(stored.iter().all(|occurrence| occurrence.amount == 10.0));
    }

    #[test]
    fn update_missing_rule_is_not_found() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);

        let result = update_recurring(
            &store,
            user_id,
            42,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01)),
            &rent(),
        );

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn update_rule_of_other_user_is_not_found() {
        let conn = get_test_connection();
        let owner = create_test_user(&conn);
        let intruder = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let schedule = monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01));
        let (rule, _) = create_recurring(&store, owner, &schedule, &rent()).unwrap();

        let result = update_recurring(&store, intruder, rule.id, &schedule, &rent());

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(stored_dates(&store, owner, rule.id).len(), 3);
    }

    #[test]
    fn failed_extension_keeps_partial_tail_and_old_rule() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let original = monthly(date!(2024 - 01 - 01), date!(2024 - 03 - 01));
        let (rule, _) = create_recurring(&store, user_id, &original, &rent()).unwrap();
        let failing = FailingStore::new(store, 1);

        let result = update_recurring(
            &failing,
            user_id,
            rule.id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 06 - 01)),
            &rent(),
        );

        assert_eq!(result, Err(Error::DatabaseLockError));
        assert_eq!(
            stored_dates(&store, user_id, rule.id),
            vec![date!(2024 - 01 - 01), date!(2024 - 02 - 01), date!(2024 - 03 - 01)],
            "the occurrence inserted before the failure is kept"
        );
        assert_eq!(
            store.get_rule(user_id, rule.id).unwrap().schedule,
            original,
            "the rule keeps its old schedule"
        );
    }

    #[test]
    fn delete_removes_rule_and_occurrences() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);
        let (rule, _) = create_recurring(
            &store,
            user_id,
            &monthly(date!(2024 - 01 - 01), date!(2024 - 04 - 01)),
            &rent(),
        )
        .unwrap();

        let deleted = delete_recurring(&store, user_id, rule.id).unwrap();

        assert_eq!(deleted, 3);
        assert_eq!(store.get_rule(user_id, rule.id), Err(Error::NotFound));
        assert!(stored_dates(&store, user_id, rule.id).is_empty());
    }

    #[test]
    fn delete_missing_rule_is_not_found() {
        let conn = get_test_connection();
        let user_id = create_test_user(&conn);
        let store = SQLiteRecurrenceStore::new(&conn);

        assert_eq!(delete_recurring(&store, user_id, 7), Err(Error::NotFound));
    }
}
