//! The recurrence rule, its schedule and the template copied into each occurrence.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, RecurrenceId, UserID, recurrence::date_cursor::DateRange};

/// The longest description a transaction may have, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 512;

/// The step between two occurrences, without the custom day count.
///
/// This is the shape used on the wire and in the database. `Other` is
/// accepted as an older name for `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalKind {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month.
    Monthly,
    /// Every N days.
    #[serde(alias = "Other")]
    Custom,
}

impl IntervalKind {
    /// Every interval kind, in the order they are shown to users.
    pub const ALL: [IntervalKind; 4] = [
        IntervalKind::Daily,
        IntervalKind::Weekly,
        IntervalKind::Monthly,
        IntervalKind::Custom,
    ];

    /// The name of the interval kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Daily => "Daily",
            IntervalKind::Weekly => "Weekly",
            IntervalKind::Monthly => "Monthly",
            IntervalKind::Custom => "Custom",
        }
    }
}

impl Display for IntervalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Daily" => Ok(IntervalKind::Daily),
            "Weekly" => Ok(IntervalKind::Weekly),
            "Monthly" => Ok(IntervalKind::Monthly),
            "Custom" | "Other" => Ok(IntervalKind::Custom),
            other => Err(Error::InvalidRecurrence(format!(
                "\"{other}\" is not a valid interval"
            ))),
        }
    }
}

impl ToSql for IntervalKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IntervalKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// The step between two occurrences of a recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Every calendar month, on the start date's day of the month.
    Monthly,
    /// Every N days.
    ///
    /// A day count of zero is never accepted from users, but a stored rule
    /// with one simply has no occurrences.
    Custom(u32),
}

impl Interval {
    /// Combine an interval kind and an optional custom day count.
    ///
    /// # Errors
    /// Returns an [Error::InvalidRecurrence] if:
    /// - `kind` is `Custom` and `days_interval` is missing or zero,
    /// - or `kind` is not `Custom` and `days_interval` is set.
    pub fn from_parts(kind: IntervalKind, days_interval: Option<u32>) -> Result<Self, Error> {
        match (kind, days_interval) {
            (IntervalKind::Custom, Some(days)) if days >= 1 => Ok(Interval::Custom(days)),
            (IntervalKind::Custom, _) => Err(Error::InvalidRecurrence(
                "a custom interval needs a day count of at least one".to_owned(),
            )),
            (_, Some(_)) => Err(Error::InvalidRecurrence(format!(
                "a day count can only be set for a custom interval, not {kind}"
            ))),
            (IntervalKind::Daily, None) => Ok(Interval::Daily),
            (IntervalKind::Weekly, None) => Ok(Interval::Weekly),
            (IntervalKind::Monthly, None) => Ok(Interval::Monthly),
        }
    }

    /// Rebuild an interval from a database row without validating it.
    pub(crate) fn from_stored(kind: IntervalKind, days_interval: Option<u32>) -> Self {
        match kind {
            IntervalKind::Daily => Interval::Daily,
            IntervalKind::Weekly => Interval::Weekly,
            IntervalKind::Monthly => Interval::Monthly,
            IntervalKind::Custom => Interval::Custom(days_interval.unwrap_or(0)),
        }
    }

    /// The kind of interval, without the custom day count.
    pub fn kind(&self) -> IntervalKind {
        match self {
            Interval::Daily => IntervalKind::Daily,
            Interval::Weekly => IntervalKind::Weekly,
            Interval::Monthly => IntervalKind::Monthly,
            Interval::Custom(_) => IntervalKind::Custom,
        }
    }

    /// The custom day count, `None` unless this is a custom interval.
    pub fn days_interval(&self) -> Option<u32> {
        match self {
            Interval::Custom(days) => Some(*days),
            _ => None,
        }
    }
}

/// When a recurrence rule produces occurrences.
///
/// Occurrences fall on the grid `start + k * interval` for `k = 0, 1, ...`
/// and stop before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// The date of the first occurrence.
    pub start: Date,
    /// The exclusive upper bound for occurrence dates.
    pub end: Date,
    /// The step between occurrences.
    pub interval: Interval,
}

impl Schedule {
    /// Create a validated schedule.
    ///
    /// # Errors
    /// Returns an [Error::InvalidRecurrence] if `start` is after `end` or the
    /// interval is a custom interval of zero days.
    pub fn new(start: Date, end: Date, interval: Interval) -> Result<Self, Error> {
        let schedule = Self {
            start,
            end,
            interval,
        };
        schedule.validate()?;

        Ok(schedule)
    }

    /// Check the schedule's invariants.
    ///
    /// # Errors
    /// Returns an [Error::InvalidRecurrence] if `start` is after `end` or the
    /// interval is a custom interval of zero days.
    pub fn validate(&self) -> Result<(), Error> {
        if self.start > self.end {
            return Err(Error::InvalidRecurrence(
                "the start date must not be after the end date".to_owned(),
            ));
        }

        if self.interval == Interval::Custom(0) {
            return Err(Error::InvalidRecurrence(
                "a custom interval needs a day count of at least one".to_owned(),
            ));
        }

        Ok(())
    }

    /// The window of the rule's whole lifetime, `[start, end)`.
    pub fn lifetime(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }
}

/// The fields copied into every occurrence of a recurrence rule.
///
/// One-off transactions are validated with the same rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Positive for income, negative for expenses.
    pub amount: f64,
    /// A text description of what the transaction is for.
    pub description: String,
    /// The transaction type, e.g. "Salary" or "Groceries".
    pub category: String,
}

impl Template {
    /// Create a validated template. Surrounding whitespace is trimmed from
    /// `description` and `category`.
    ///
    /// # Errors
    /// Returns an [Error::InvalidTransaction] if the amount is zero or not
    /// finite, the description is empty or longer than
    /// [MAX_DESCRIPTION_LENGTH] characters, or the category is empty.
    pub fn new(amount: f64, description: &str, category: &str) -> Result<Self, Error> {
        let template = Self {
            amount,
            description: description.trim().to_owned(),
            category: category.trim().to_owned(),
        };
        template.validate()?;

        Ok(template)
    }

    /// Check the template's invariants.
    ///
    /// # Errors
    /// See [Template::new].
    pub fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount == 0.0 {
            return Err(Error::InvalidTransaction(
                "the amount must be a non-zero number".to_owned(),
            ));
        }

        let description_length = self.description.chars().count();
        if description_length == 0 || description_length > MAX_DESCRIPTION_LENGTH {
            return Err(Error::InvalidTransaction(format!(
                "the description must be between 1 and {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }

        if self.category.is_empty() {
            return Err(Error::InvalidTransaction(
                "the transaction type must not be empty".to_owned(),
            ));
        }

        Ok(())
    }
}

/// A stored recurring transaction: a schedule plus the template for its occurrences.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurrenceRule {
    /// The ID of the rule.
    pub id: RecurrenceId,
    /// The user that owns the rule and all of its occurrences.
    pub user_id: UserID,
    /// When the rule produces occurrences.
    pub schedule: Schedule,
    /// The fields copied into each occurrence.
    pub template: Template,
    /// When the rule was created.
    pub created: OffsetDateTime,
    /// When the rule was last changed.
    pub updated: OffsetDateTime,
}

#[cfg(test)]
mod models_tests {
    use time::macros::date;

    use crate::{
        Error,
        recurrence::models::{Interval, IntervalKind, MAX_DESCRIPTION_LENGTH, Schedule, Template},
    };

    #[test]
    fn custom_interval_needs_day_count() {
        assert_eq!(
            Interval::from_parts(IntervalKind::Custom, Some(10)),
            Ok(Interval::Custom(10))
        );
        assert!(matches!(
            Interval::from_parts(IntervalKind::Custom, None),
            Err(Error::InvalidRecurrence(_))
        ));
        assert!(matches!(
            Interval::from_parts(IntervalKind::Custom, Some(0)),
            Err(Error::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn day_count_only_allowed_for_custom_interval() {
        assert_eq!(
            Interval::from_parts(IntervalKind::Weekly, None),
            Ok(Interval::Weekly)
        );
        assert!(matches!(
            Interval::from_parts(IntervalKind::Weekly, Some(3)),
            Err(Error::InvalidRecurrence(_))
        ));
    }

    #[test]
    fn interval_round_trips_through_parts() {
        for interval in [
            Interval::Daily,
            Interval::Weekly,
            Interval::Monthly,
            Interval::Custom(14),
        ] {
            assert_eq!(
                Interval::from_parts(interval.kind(), interval.days_interval()),
                Ok(interval)
            );
        }
    }

    #[test]
    fn other_is_an_alias_for_custom() {
        let kind: IntervalKind = serde_json::from_str("\"Other\"").unwrap();

        assert_eq!(kind, IntervalKind::Custom);
        assert_eq!("Other".parse::<IntervalKind>(), Ok(IntervalKind::Custom));
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"Custom\"");
    }

    #[test]
    fn schedule_rejects_start_after_end() {
        let result = Schedule::new(date!(2024 - 02 - 01), date!(2024 - 01 - 01), Interval::Daily);

        assert!(matches!(result, Err(Error::InvalidRecurrence(_))));
    }

    #[test]
    fn schedule_accepts_start_equal_to_end() {
        let result = Schedule::new(date!(2024 - 01 - 01), date!(2024 - 01 - 01), Interval::Daily);

        assert!(result.is_ok());
    }

    #[test]
    fn schedule_rejects_zero_day_custom_interval() {
        let result = Schedule::new(
            date!(2024 - 01 - 01),
            date!(2024 - 02 - 01),
            Interval::Custom(0),
        );

        assert!(matches!(result, Err(Error::InvalidRecurrence(_))));
    }

    #[test]
    fn template_trims_description() {
        let template = Template::new(-12.5, "  Rent  ", " Rent ").unwrap();

        assert_eq!(template.description, "Rent");
        assert_eq!(template.category, "Rent");
    }

    #[test]
    fn template_rejects_zero_and_non_finite_amounts() {
        for amount in [0.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Template::new(amount, "Rent", "Rent"),
                Err(Error::InvalidTransaction(_))
            ));
        }
    }

    #[test]
    fn template_rejects_bad_descriptions() {
        let too_long = "a".repeat(MAX_DESCRIPTION_LENGTH + 1);
        let longest = "a".repeat(MAX_DESCRIPTION_LENGTH);

        assert!(Template::new(1.0, "   ", "Salary").is_err());
        assert!(Template::new(1.0, &too_long, "Salary").is_err());
        assert!(Template::new(1.0, &longest, "Salary").is_ok());
    }

    #[test]
    fn template_rejects_empty_category() {
        assert!(matches!(
            Template::new(1.0, "Pay", " "),
            Err(Error::InvalidTransaction(_))
        ));
    }
}
