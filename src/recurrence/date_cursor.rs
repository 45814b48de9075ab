//! Calendar arithmetic on UTC dates.
//!
//! Every function saturates at [Date::MIN]/[Date::MAX] instead of panicking,
//! so callers walking far into the future terminate instead of overflowing.

use time::{Date, Duration, Month};

/// Wider than the number of days between [Date::MIN] and [Date::MAX].
const MAX_DAY_SPAN: i64 = 8_000_000;

/// Add `n` days to `date`. `n` may be negative.
pub fn add_days(date: Date, n: i64) -> Date {
    match n {
        n if n > MAX_DAY_SPAN => Date::MAX,
        n if n < -MAX_DAY_SPAN => Date::MIN,
        n => date.saturating_add(Duration::days(n)),
    }
}

/// Add `n` weeks to `date`, i.e. `7n` days.
pub fn add_weeks(date: Date, n: i64) -> Date {
    add_days(date, n.saturating_mul(7))
}

/// Add `n` calendar months to `date`.
///
/// The day of the month is kept where the target month has it, otherwise it
/// is clamped to the last day of that month (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: Date, n: i64) -> Date {
    let saturated = if n < 0 { Date::MIN } else { Date::MAX };

    let month_index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month()) - 1);
    let Some(month_index) = month_index.checked_add(n) else {
        return saturated;
    };

    let Ok(year) = i32::try_from(month_index.div_euclid(12)) else {
        return saturated;
    };
    // rem_euclid(12) is always in 0..12.
    let Ok(month) = Month::try_from(month_index.rem_euclid(12) as u8 + 1) else {
        return saturated;
    };

    let day = date.day().min(days_in_month(year, month));

    Date::from_calendar_date(year, month, day).unwrap_or(saturated)
}

/// The number of whole days between `a` and `b`, regardless of order.
pub fn days_between(a: Date, b: Date) -> i64 {
    (b - a).whole_days().abs()
}

/// The number of calendar months between `a` and `b`, regardless of order.
///
/// Only the year and month take part in the count, the day of the month is
/// ignored: Jan 31 and Feb 1 are one month apart, as are Jan 1 and Feb 28.
pub fn months_between(a: Date, b: Date) -> i64 {
    let (early, late) = if a <= b { (a, b) } else { (b, a) };

    let years = i64::from(late.year()) - i64::from(early.year());
    let months = i64::from(u8::from(late.month())) - i64::from(u8::from(early.month()));

    years * 12 + months
}

/// The number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// A half-open date window `[start, end)`.
///
/// A window whose start is not before its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first date in the window.
    pub start: Date,
    /// The first date after the window.
    pub end: Date,
}

impl DateRange {
    /// Create the window `[start, end)`.
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Create a window from inclusive bounds, i.e. `[first, last]`.
    pub fn inclusive(first: Date, last: Date) -> Self {
        Self {
            start: first,
            end: add_days(last, 1),
        }
    }

    /// Whether `date` lies inside the window.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }

    /// Whether the window contains no dates at all.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The window covering every day of `month` in `year`.
///
/// Returns `None` if the year is outside the supported date range.
pub fn month_window(year: i32, month: Month) -> Option<DateRange> {
    let start = Date::from_calendar_date(year, month, 1).ok()?;

    Some(DateRange::new(start, add_months(start, 1)))
}

/// The window covering every day of `year`.
///
/// Returns `None` if the year is outside the supported date range.
pub fn year_window(year: i32) -> Option<DateRange> {
    let start = Date::from_calendar_date(year, Month::January, 1).ok()?;

    Some(DateRange::new(start, add_months(start, 12)))
}
