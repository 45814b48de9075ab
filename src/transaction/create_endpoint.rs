//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    Error, UserID,
    recurrence::{SQLiteRecurrenceStore, create_recurring},
    transaction::{
        core::create_transaction,
        request::{
            RecurringTransaction, RecurringTransactionWithOccurrences, TransactionDraft,
            TransactionRequest,
        },
        state::TransactionState,
    },
};

/// A route handler for creating a one-off or recurring transaction.
///
/// Responds with the created transaction, or with the recurring transaction
/// and every occurrence of its lifetime.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(request): Json<TransactionRequest>,
) -> Result<Response, Error> {
    let draft = request.into_draft()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match draft {
        TransactionDraft::OneOff(builder) => {
            let transaction = create_transaction(user_id, builder, &connection)?;

            Ok((StatusCode::CREATED, Json(transaction)).into_response())
        }
        TransactionDraft::Recurring(schedule, template) => {
            let store = SQLiteRecurrenceStore::new(&connection);
            let (rule, occurrences) = create_recurring(&store, user_id, &schedule, &template)?;

            Ok((
                StatusCode::CREATED,
                Json(RecurringTransactionWithOccurrences {
                    recurring_transaction: RecurringTransaction::from(&rule),
                    occurrences,
                }),
            )
                .into_response())
        }
    }
}
