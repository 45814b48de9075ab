//! Endpoints for reading transactions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::{
    Error, TransactionId, UserID,
    transaction::{
        Transaction,
        core::{get_transaction, get_transactions_in_range, get_unassigned_transactions},
        query::{DateRangeQuery, MonthQuery, matches_income_filter},
        state::TransactionState,
    },
};

/// A route handler for listing the transactions of a month in date order.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let window = query.window()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions_in_range(user_id, window, &connection)?
        .into_iter()
        .filter(|transaction| matches_income_filter(transaction, query.income))
        .collect();

    Ok(Json(transactions))
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_transaction(user_id, transaction_id, &connection).map(Json)
}

/// A route handler for listing transactions in a date range that are not assigned to a budget.
pub async fn list_unassigned_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let window = query.window()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_unassigned_transactions(user_id, window, &connection).map(Json)
}
