//! Code for creating the user table and fetching users from the database.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{AppState, Error, auth::ProviderUser};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application, as known to an identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The name of the identity provider the user logs in with, e.g. "google".
    pub provider: String,
    /// The user's ID at the identity provider.
    pub provider_id: String,
    /// The display name reported by the identity provider.
    pub username: String,
    /// The email address reported by the identity provider.
    pub email: String,
    /// A URL to the user's profile picture, if they have one.
    pub avatar: Option<String>,
    /// When the user first logged in.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// When the user's profile was last refreshed from the identity provider.
    #[serde(with = "time::serde::rfc3339")]
    pub updated: OffsetDateTime,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                provider TEXT NOT NULL,
                provider_id TEXT NOT NULL,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                avatar TEXT,
                created TEXT NOT NULL,
                updated TEXT NOT NULL,
                UNIQUE(provider, provider_id)
                )",
        (),
    )?;

    Ok(())
}

/// Insert the user reported by an identity provider, or refresh their profile
/// if they have logged in before.
///
/// Users are identified by the pair (`provider`, `profile.provider_id`).
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_or_create_user(
    provider: &str,
    profile: &ProviderUser,
    connection: &Connection,
) -> Result<User, Error> {
    let user = connection
        .prepare(
            "INSERT INTO user (provider, provider_id, username, email, avatar, created, updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
             ON CONFLICT(provider, provider_id) DO UPDATE SET
                username = excluded.username,
                email = excluded.email,
                avatar = excluded.avatar,
                updated = excluded.updated
             RETURNING id, provider, provider_id, username, email, avatar, created, updated",
        )?
        .query_row(
            (
                provider,
                &profile.provider_id,
                &profile.username,
                &profile.email,
                &profile.avatar,
                OffsetDateTime::now_utc(),
            ),
            map_user_row,
        )?;

    Ok(user)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, db_connection: &Connection) -> Result<User, Error> {
    db_connection
        .prepare(
            "SELECT id, provider, provider_id, username, email, avatar, created, updated
             FROM user WHERE id = :id",
        )?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserID::new(row.get(0)?),
        provider: row.get(1)?,
        provider_id: row.get(2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        avatar: row.get(5)?,
        created: row.get(6)?,
        updated: row.get(7)?,
    })
}

/// The state needed to look up users.
#[derive(Debug, Clone)]
pub struct UserState {
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UserState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the logged in user.
pub async fn get_current_user(
    State(state): State<UserState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<User>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_by_id(user_id, &connection).map(Json)
}
