//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{auth_guard, get_log_out, handle_provider_callback, redirect_to_provider},
    budget::{
        assign_transaction_endpoint, create_budget_endpoint, create_budget_expense_endpoint,
        delete_budget_endpoint, delete_budget_expense_endpoint, get_budget_endpoint,
        list_budget_transactions_endpoint, list_budgets_endpoint, unassign_transaction_endpoint,
        update_budget_endpoint, update_budget_expense_endpoint,
    },
    endpoints,
    summary::{
        get_month_summary, get_month_types_summary, get_year_summary, get_year_types_summary,
    },
    transaction::{
        create_transaction_endpoint, delete_recurring_endpoint, delete_transaction_endpoint,
        edit_transaction_endpoint, get_expense_types, get_income_types, get_intervals,
        get_recurring_endpoint, get_transaction_endpoint, list_transactions_endpoint,
        list_unassigned_transactions_endpoint, update_recurring_endpoint,
    },
    user::get_current_user,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::PING, get(get_ping))
        .route(endpoints::AUTH_PROVIDER, get(redirect_to_provider))
        .route(endpoints::AUTH_CALLBACK, get(handle_provider_callback))
        .route(endpoints::LOG_OUT, get(get_log_out));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::UNASSIGNED_TRANSACTIONS,
            get(list_unassigned_transactions_endpoint),
        )
        .route(endpoints::INTERVALS, get(get_intervals))
        .route(endpoints::INCOME_TYPES, get(get_income_types))
        .route(endpoints::EXPENSE_TYPES, get(get_expense_types))
        .route(
            endpoints::RECURRING_TRANSACTION,
            get(get_recurring_endpoint)
                .put(update_recurring_endpoint)
                .delete(delete_recurring_endpoint),
        )
        .route(endpoints::MONTH_SUMMARY, get(get_month_summary))
        .route(endpoints::YEAR_SUMMARY, get(get_year_summary))
        .route(endpoints::MONTH_TYPES_SUMMARY, get(get_month_types_summary))
        .route(endpoints::YEAR_TYPES_SUMMARY, get(get_year_types_summary))
        .route(
            endpoints::BUDGETS,
            get(list_budgets_endpoint).post(create_budget_endpoint),
        )
        .route(
            endpoints::BUDGET,
            get(get_budget_endpoint)
                .put(update_budget_endpoint)
                .delete(delete_budget_endpoint),
        )
        .route(
            endpoints::BUDGET_EXPENSES,
            post(create_budget_expense_endpoint),
        )
        .route(
            endpoints::BUDGET_EXPENSE,
            put(update_budget_expense_endpoint).delete(delete_budget_expense_endpoint),
        )
        .route(
            endpoints::BUDGET_TRANSACTIONS,
            get(list_budget_transactions_endpoint).post(assign_transaction_endpoint),
        )
        .route(
            endpoints::BUDGET_TRANSACTION,
            delete(unassign_transaction_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Check that the server is up.
async fn get_ping() -> Json<serde_json::Value> {
    Json(json!({ "message": "Pong" }))
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}
