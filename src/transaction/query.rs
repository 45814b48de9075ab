//! Query parameters shared by the transaction list and summary endpoints.

use serde::Deserialize;
use time::{Date, Month, OffsetDateTime};

use crate::{
    Error,
    recurrence::{DateRange, month_window, year_window},
    transaction::Transaction,
};

/// Selects a calendar month. Missing fields default to the current UTC month and year.
#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    /// The month number, 1 to 12.
    pub month: Option<u8>,
    /// The calendar year.
    pub year: Option<i32>,
    /// `true` keeps income, `false` keeps expenses, absent keeps both.
    pub income: Option<bool>,
}

impl MonthQuery {
    /// The year and month the query selects.
    ///
    /// # Errors
    /// Returns [Error::InvalidQuery] if the month is not between 1 and 12.
    pub fn year_month(&self) -> Result<(i32, Month), Error> {
        let today = OffsetDateTime::now_utc().date();
        let month = match self.month {
            Some(number) => Month::try_from(number).map_err(|_| {
                Error::InvalidQuery(format!("month must be between 1 and 12, got {number}"))
            })?,
            None => today.month(),
        };

        Ok((self.year.unwrap_or(today.year()), month))
    }

    /// The window covering the selected month.
    ///
    /// # Errors
    /// Returns [Error::InvalidQuery] if the month or year is out of range.
    pub fn window(&self) -> Result<DateRange, Error> {
        let (year, month) = self.year_month()?;

        month_window(year, month)
            .ok_or_else(|| Error::InvalidQuery(format!("year {year} is out of range")))
    }
}

/// Selects a calendar year. A missing year defaults to the current UTC year.
#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    /// The calendar year.
    pub year: Option<i32>,
    /// `true` keeps income, `false` keeps expenses, absent keeps both.
    pub income: Option<bool>,
}

impl YearQuery {
    /// The selected year.
    pub fn year(&self) -> i32 {
        self.year
            .unwrap_or_else(|| OffsetDateTime::now_utc().date().year())
    }

    /// The window covering the selected year.
    ///
    /// # Errors
    /// Returns [Error::InvalidQuery] if the year is out of range.
    pub fn window(&self) -> Result<DateRange, Error> {
        let year = self.year();

        year_window(year).ok_or_else(|| Error::InvalidQuery(format!("year {year} is out of range")))
    }
}

/// An inclusive date range given as `startDate` and `endDate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    /// The first date in the range.
    pub start_date: Date,
    /// The last date in the range.
    pub end_date: Date,
}

impl DateRangeQuery {
    /// The half-open window covering both dates.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if the start date is after the end date.
    pub fn window(&self) -> Result<DateRange, Error> {
        if self.start_date > self.end_date {
            return Err(Error::InvalidDateRange);
        }

        Ok(DateRange::inclusive(self.start_date, self.end_date))
    }
}

/// Whether `transaction` passes the income filter of a query.
pub fn matches_income_filter(transaction: &Transaction, income: Option<bool>) -> bool {
    match income {
        Some(true) => transaction.amount > 0.0,
        Some(false) => transaction.amount < 0.0,
        None => true,
    }
}
