//! Defines the endpoint for updating a transaction.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error, TransactionId, UserID,
    budget::unassign_if_outside_budget,
    recurrence::{SQLiteRecurrenceStore, update_recurring},
    transaction::{
        core::{get_transaction, update_transaction},
        recurring_endpoint::ReconciliationResponse,
        request::{TransactionDraft, TransactionRequest},
        state::TransactionState,
    },
};

/// A route handler for updating a transaction.
///
/// A one-off transaction is updated in place. Sending a recurring body for an
/// occurrence of a recurring transaction updates the whole recurring
/// transaction. A transaction cannot be switched between the two kinds.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
    Json(request): Json<TransactionRequest>,
) -> Result<Response, Error> {
    let draft = request.into_draft()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let existing = get_transaction(user_id, transaction_id, &connection)?;

    match (existing.recurrence_id, draft) {
        (None, TransactionDraft::OneOff(builder)) => {
            let updated = update_transaction(user_id, transaction_id, builder, &connection)?;
            let updated = unassign_if_outside_budget(user_id, updated, &connection)?;

            Ok(Json(updated).into_response())
        }
        (Some(rule_id), TransactionDraft::Recurring(schedule, template)) => {
            let store = SQLiteRecurrenceStore::new(&connection);
            let reconciliation = update_recurring(&store, user_id, rule_id, &schedule, &template)?;

            Ok(Json(ReconciliationResponse::from(reconciliation)).into_response())
        }
        (None, TransactionDraft::Recurring(..)) => Err(Error::InvalidTransaction(
            "a one-off transaction cannot be made recurring".to_owned(),
        )),
        (Some(_), TransactionDraft::OneOff(_)) => Err(Error::InvalidTransaction(
            "an occurrence of a recurring transaction cannot be made one-off".to_owned(),
        )),
    }
}
