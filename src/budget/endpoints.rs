//! Route handlers for budgets, their expenses and their transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, BudgetExpenseId, BudgetId, Error, TransactionId, UserID,
    budget::{
        assignment::{
            assign_transaction, get_budget_transactions, unassign_transaction,
        },
        core::{
            Budget, BudgetRequest, create_budget, delete_budget, get_budget, get_budgets,
            update_budget,
        },
        expense::{
            BudgetExpense, BudgetExpenseRequest, create_budget_expense, delete_budget_expense,
            update_budget_expense,
        },
    },
    transaction::Transaction,
};

/// The state needed by the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body for assigning a transaction to a budget.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTransactionRequest {
    /// The transaction to assign.
    pub transaction_id: TransactionId,
}

/// A route handler listing the user's budgets.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Budget>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(Json(get_budgets(user_id, &connection)?))
}

/// A route handler for creating a budget.
pub async fn create_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<BudgetRequest>,
) -> Result<(StatusCode, Json<Budget>), Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = create_budget(user_id, &request, &connection)?;

    Ok((StatusCode::CREATED, Json(budget)))
}

/// A route handler for a single budget and its expenses.
pub async fn get_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Budget>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(Json(get_budget(user_id, budget_id, &connection)?))
}

/// A route handler for updating a budget.
///
/// Transactions that no longer fall within the budget are unassigned in the
/// same SQL transaction.
pub async fn update_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Json(request): Json<BudgetRequest>,
) -> Result<Json<Budget>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let sql_transaction = connection.unchecked_transaction()?;
    let budget = update_budget(user_id, budget_id, &request, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(Json(budget))
}

/// A route handler for deleting a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let sql_transaction = connection.unchecked_transaction()?;
    delete_budget(user_id, budget_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler for adding an expense line to a budget.
pub async fn create_budget_expense_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Json(request): Json<BudgetExpenseRequest>,
) -> Result<(StatusCode, Json<BudgetExpense>), Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_budget_expense(user_id, budget_id, &request, &connection)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// A route handler for updating an expense line.
pub async fn update_budget_expense_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path((budget_id, expense_id)): Path<(BudgetId, BudgetExpenseId)>,
    Json(request): Json<BudgetExpenseRequest>,
) -> Result<Json<BudgetExpense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = update_budget_expense(user_id, budget_id, expense_id, &request, &connection)?;

    Ok(Json(expense))
}

/// A route handler for deleting an expense line.
pub async fn delete_budget_expense_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path((budget_id, expense_id)): Path<(BudgetId, BudgetExpenseId)>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget_expense(user_id, budget_id, expense_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}

/// A route handler listing the transactions assigned to a budget.
pub async fn list_budget_transactions_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    Ok(Json(get_budget_transactions(
        user_id,
        budget_id,
        &connection,
    )?))
}

/// A route handler for assigning a transaction to a budget.
pub async fn assign_transaction_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path(budget_id): Path<BudgetId>,
    Json(request): Json<AssignTransactionRequest>,
) -> Result<Json<Transaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction =
        assign_transaction(user_id, budget_id, request.transaction_id, &connection)?;

    Ok(Json(transaction))
}

/// A route handler for removing a transaction from a budget.
pub async fn unassign_transaction_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserID>,
    Path((budget_id, transaction_id)): Path<(BudgetId, TransactionId)>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    unassign_transaction(user_id, budget_id, transaction_id, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
