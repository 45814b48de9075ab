//! Expands a schedule into the occurrence dates that fall inside a window.

use time::Date;

use crate::recurrence::{
    date_cursor::{DateRange, add_days, add_months, add_weeks, days_between, months_between},
    models::{Interval, Schedule},
};

/// The dates of `schedule` that fall inside `window`, in ascending order.
///
/// Every date is on the schedule's grid, is at least `window.start`, and is
/// before both `schedule.end` and `window.end`. The sequence is empty when
/// the window is empty, when `schedule.start >= schedule.end`, or when the
/// interval is a custom interval of zero days.
///
/// If the schedule starts before the window, the first date is found with
/// closed-form arithmetic rather than by stepping from the start.
pub fn expand(schedule: &Schedule, window: DateRange) -> ScheduleDates {
    let end = schedule.end.min(window.end);

    let is_empty = window.is_empty()
        || schedule.start >= schedule.end
        || schedule.interval == Interval::Custom(0);

    let step = if is_empty {
        None
    } else {
        Some(first_step_on_or_after(schedule, window.start))
    };

    ScheduleDates {
        start: schedule.start,
        interval: schedule.interval,
        end,
        step,
    }
}

/// The `step`-th date of the grid anchored at `start`.
///
/// Each date is computed from `start` rather than from the previous date so
/// that monthly rules starting on the 31st return to the 31st after a short
/// month.
pub fn nth_date(start: Date, interval: Interval, step: i64) -> Date {
    match interval {
        Interval::Daily => add_days(start, step),
        Interval::Weekly => add_weeks(start, step),
        Interval::Monthly => add_months(start, step),
        Interval::Custom(days) => add_days(start, step.saturating_mul(i64::from(days))),
    }
}

/// The index of the first grid point on or after `from`.
fn first_step_on_or_after(schedule: &Schedule, from: Date) -> i64 {
    if schedule.start >= from {
        return 0;
    }

    let days = days_between(schedule.start, from);

    match schedule.interval {
        Interval::Daily => days,
        Interval::Weekly => div_ceil(days, 7),
        Interval::Monthly => {
            // Month counting ignores the day of the month, so the grid point in
            // `from`'s month can still be before `from`, e.g. the 15th when
            // `from` is the 20th. It is never after the first valid point.
            let step = months_between(schedule.start, from);

            if nth_date(schedule.start, Interval::Monthly, step) < from {
                step + 1
            } else {
                step
            }
        }
        Interval::Custom(interval_days) => div_ceil(days, i64::from(interval_days.max(1))),
    }
}

fn div_ceil(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}

/// The ascending occurrence dates produced by [expand].
///
/// Each call to [expand] starts a fresh sequence, and cloning a partially
/// consumed sequence continues from the same point.
#[derive(Debug, Clone)]
pub struct ScheduleDates {
    start: Date,
    interval: Interval,
    end: Date,
    step: Option<i64>,
}

impl Iterator for ScheduleDates {
    type Item = Date;

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.step?;
        let date = nth_date(self.start, self.interval, step);

        // Dates saturate at `Date::MAX`, so this also ends the sequence at the
        // edge of the calendar.
        if date >= self.end || step == i64::MAX {
            self.step = None;
            return None;
        }

        self.step = Some(step + 1);
        Some(date)
    }
}
