//! Endpoints for reading, updating and deleting recurring transactions.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::{
    Error, RecurrenceId, UserID,
    recurrence::{
        Reconciliation, RecurrenceStore, SQLiteRecurrenceStore, ScheduleChange, delete_recurring,
        update_recurring,
    },
    transaction::{
        request::{RecurringTransaction, RecurringTransactionWithOccurrences, TransactionRequest},
        state::TransactionState,
    },
};

/// What updating a recurring transaction did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResponse {
    /// The recurring transaction as saved.
    pub recurring_transaction: RecurringTransaction,
    /// How the schedule edit was applied.
    pub change: ScheduleChange,
    /// The number of occurrences inserted.
    pub inserted: usize,
    /// The number of occurrences deleted.
    pub deleted: usize,
    /// The number of occurrences patched in place.
    pub patched: usize,
}

impl From<Reconciliation> for ReconciliationResponse {
    fn from(reconciliation: Reconciliation) -> Self {
        Self {
            recurring_transaction: RecurringTransaction::from(&reconciliation.rule),
            change: reconciliation.change,
            inserted: reconciliation.inserted,
            deleted: reconciliation.deleted,
            patched: reconciliation.patched,
        }
    }
}

/// The body returned after deleting a recurring transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecurringTransaction {
    /// The number of occurrences deleted with the rule.
    pub deleted_occurrences: usize,
}

/// A route handler for getting a recurring transaction and its occurrences.
pub async fn get_recurring_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(rule_id): Path<RecurrenceId>,
) -> Result<Json<RecurringTransactionWithOccurrences>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let store = SQLiteRecurrenceStore::new(&connection);

    let rule = store.get_rule(user_id, rule_id)?;
    let occurrences = store.list_occurrences_for_rule(user_id, rule_id)?;

    Ok(Json(RecurringTransactionWithOccurrences {
        recurring_transaction: RecurringTransaction::from(&rule),
        occurrences,
    }))
}

/// A route handler for updating a recurring transaction and reconciling its occurrences.
pub async fn update_recurring_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(rule_id): Path<RecurrenceId>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<ReconciliationResponse>, Error> {
    let (schedule, template) = request.into_recurring()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let store = SQLiteRecurrenceStore::new(&connection);

    update_recurring(&store, user_id, rule_id, &schedule, &template)
        .map(|reconciliation| Json(reconciliation.into()))
}

/// A route handler for deleting a recurring transaction and all of its occurrences.
pub async fn delete_recurring_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(rule_id): Path<RecurrenceId>,
) -> Result<Json<DeletedRecurringTransaction>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;
    let store = SQLiteRecurrenceStore::new(&connection);

    let deleted_occurrences = delete_recurring(&store, user_id, rule_id)?;

    Ok(Json(DeletedRecurringTransaction {
        deleted_occurrences,
    }))
}
