//! Income/expense totals and per-type totals for the summary endpoints.
//!
//! All functions here are pure. Callers pick the transactions (month, year,
//! income or expense) before aggregating.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// The number of months a yearly total is averaged over.
const MONTHS_PER_YEAR: f64 = 12.0;

/// The money earned and spent in a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthInfo {
    /// The sum of the positive amounts.
    pub income: f64,
    /// The absolute value of the sum of the negative amounts.
    pub expense: f64,
}

/// Split `amounts` by sign into income and expense totals.
///
/// `income - expense` equals the sum of `amounts`. Zero amounts count towards neither.
pub fn month_info(amounts: impl IntoIterator<Item = f64>) -> MonthInfo {
    let (income, spent) = amounts
        .into_iter()
        .fold((0.0, 0.0), |(income, spent), amount| {
            if amount > 0.0 {
                (income + amount, spent)
            } else {
                (income, spent + amount)
            }
        });

    MonthInfo {
        income,
        expense: spent.abs(),
    }
}

/// Sum the absolute amounts of `transactions` by type.
///
/// Every name in `categories` starts at zero so it is always present.
/// Transactions with a type outside `categories` get a bucket of their own.
pub fn per_category(
    transactions: &[Transaction],
    categories: &[&str],
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = categories
        .iter()
        .map(|category| ((*category).to_owned(), 0.0))
        .collect();

    for transaction in transactions {
        *totals.entry(transaction.category.clone()).or_insert(0.0) += transaction.amount.abs();
    }

    totals
}

/// The transactions dated in `month` (1 to 12).
fn in_month(transactions: &[Transaction], month: u8) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| u8::from(transaction.date.month()) == month)
        .cloned()
        .collect()
}

/// [month_info] for each month 1 to 12 of a year's transactions.
///
/// Every month is present, months without transactions are all zero.
pub fn year_info(transactions: &[Transaction]) -> BTreeMap<u8, MonthInfo> {
    (1..=12)
        .map(|month| {
            let amounts = in_month(transactions, month)
                .into_iter()
                .map(|transaction| transaction.amount);

            (month, month_info(amounts))
        })
        .collect()
}

/// The monthly average of [per_category] over a year's transactions.
///
/// The per-month totals for months 1 to 12 are summed, then divided by 12.
pub fn yearly_average_per_category(
    transactions: &[Transaction],
    categories: &[&str],
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();

    for month in 1..=12 {
        for (category, total) in per_category(&in_month(transactions, month), categories) {
            *totals.entry(category).or_insert(0.0) += total;
        }
    }

    for total in totals.values_mut() {
        *total /= MONTHS_PER_YEAR;
    }

    totals
}

/// Remove the types with a zero total.
pub fn drop_empty(mut totals: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    totals.retain(|_, total| *total != 0.0);
    totals
}
