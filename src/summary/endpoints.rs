//! Route handlers for the month and year summaries.

use std::collections::BTreeMap;

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    Error, UserID,
    summary::aggregation::{
        MonthInfo, drop_empty, month_info, per_category, year_info, yearly_average_per_category,
    },
    transaction::{
        EXPENSE_TYPES, INCOME_TYPES, MonthQuery, Transaction, TransactionState, YearQuery,
        get_transactions_in_range, matches_income_filter,
    },
};

fn categories_for(income: Option<bool>) -> Vec<&'static str> {
    match income {
        Some(true) => INCOME_TYPES.to_vec(),
        Some(false) => EXPENSE_TYPES.to_vec(),
        None => {
            let mut categories = INCOME_TYPES.to_vec();
            categories.extend(EXPENSE_TYPES.iter().filter(|name| !INCOME_TYPES.contains(*name)));
            categories
        }
    }
}

fn filter_by_sign(transactions: Vec<Transaction>, income: Option<bool>) -> Vec<Transaction> {
    transactions
        .into_iter()
        .filter(|transaction| matches_income_filter(transaction, income))
        .collect()
}

/// A route handler for the income and expenses of a month.
pub async fn get_month_summary(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthInfo>, Error> {
    let window = query.window()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = get_transactions_in_range(user_id, window, &connection)?;

    Ok(Json(month_info(
        transactions.iter().map(|transaction| transaction.amount),
    )))
}

/// A route handler for the income and expenses of each month of a year, keyed "1" to "12".
pub async fn get_year_summary(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearQuery>,
) -> Result<Json<BTreeMap<u8, MonthInfo>>, Error> {
    let window = query.window()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = get_transactions_in_range(user_id, window, &connection)?;

    Ok(Json(year_info(&transactions)))
}

/// A route handler for a month's totals per transaction type.
pub async fn get_month_types_summary(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<BTreeMap<String, f64>>, Error> {
    let window = query.window()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = filter_by_sign(
        get_transactions_in_range(user_id, window, &connection)?,
        query.income,
    );

    Ok(Json(drop_empty(per_category(
        &transactions,
        &categories_for(query.income),
    ))))
}

/// A route handler for a year's monthly average per transaction type.
pub async fn get_year_types_summary(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<YearQuery>,
) -> Result<Json<BTreeMap<String, f64>>, Error> {
    let window = query.window()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let transactions = filter_by_sign(
        get_transactions_in_range(user_id, window, &connection)?,
        query.income,
    );

    Ok(Json(drop_empty(yearly_average_per_category(
        &transactions,
        &categories_for(query.income),
    ))))
}
