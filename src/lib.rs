//! Fiscora is a personal finance tracker.
//!
//! This library provides the JSON REST API consumed by the Fiscora web
//! frontend: authentication, transactions (one-off and recurring), budgets
//! and monthly/yearly summaries.
//!
//! The interesting part is [recurrence]: recurring transactions are stored as
//! a rule plus the concrete, dated occurrences it generates. Editing a rule
//! reconciles the stored occurrences with the new schedule instead of
//! regenerating everything.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod database_id;
mod db;
pub mod endpoints;
mod logging;
pub mod recurrence;
mod routing;
mod summary;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, create_cookie_key};
pub use auth::{DemoProvider, IdentityProvider, IdentityProviders, ProviderUser};
pub use budget::{Budget, BudgetExpense};
pub use database_id::{BudgetExpenseId, BudgetId, DatabaseId, RecurrenceId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use summary::{
    MonthInfo, drop_empty, month_info, per_category, year_info, yearly_average_per_category,
};
pub use transaction::{Transaction, TransactionBuilder};
pub use user::{User, UserID, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the Ctrl+C signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The session token is missing, could not be decrypted, or has expired.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The session cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// Extending or formatting a cookie expiry date overflowed.
    #[error("could not compute the cookie expiry date")]
    InvalidDateFormat,

    /// The `state` returned by an identity provider did not match the one
    /// issued when the log-in flow started.
    #[error("the OAuth state does not match")]
    InvalidOAuthState,

    /// No identity provider is registered under the given name.
    #[error("unknown identity provider \"{0}\"")]
    UnknownProvider(String),

    /// The identity provider rejected the authorization code.
    ///
    /// The error string should only be logged on the server.
    #[error("could not exchange the authorization code: {0}")]
    OAuthExchange(String),

    /// A recurrence schedule is malformed, e.g. its start date is after its
    /// end date or a custom interval has no day count.
    #[error("{0}")]
    InvalidRecurrence(String),

    /// The amount, description or type of a transaction is invalid.
    #[error("{0}")]
    InvalidTransaction(String),

    /// A budget, budget expense or budget assignment is invalid.
    #[error("{0}")]
    InvalidBudget(String),

    /// The start of a date range is after its end.
    #[error("the start date must not be after the end date")]
    InvalidDateRange,

    /// A query parameter is out of range, e.g. month 13.
    #[error("{0}")]
    InvalidQuery(String),

    /// A row referenced another row that does not exist.
    #[error("a referenced resource does not exist")]
    InvalidForeignKey,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows or an
    /// update or delete did not touch any rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, _)
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Error::InvalidForeignKey
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidRecurrence(_)
            | Error::InvalidTransaction(_)
            | Error::InvalidBudget(_)
            | Error::InvalidDateRange
            | Error::InvalidQuery(_)
            | Error::InvalidForeignKey => StatusCode::BAD_REQUEST,
            Error::NotFound | Error::UnknownProvider(_) => StatusCode::NOT_FOUND,
            Error::InvalidCredentials | Error::CookieMissing => StatusCode::UNAUTHORIZED,
            Error::InvalidOAuthState => StatusCode::FORBIDDEN,
            Error::OAuthExchange(error) => {
                tracing::error!("OAuth code exchange failed: {error}");
                return error_response(StatusCode::UNAUTHORIZED, "Could not log in");
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong");
            }
        };

        error_response(status, &self.to_string())
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
