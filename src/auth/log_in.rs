//! The OAuth log-in flow: redirect to the identity provider, then handle its callback.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, Query, State},
    response::Redirect,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;
use uuid::Uuid;

use crate::{
    AppState, Error,
    auth::{
        IdentityProviders,
        cookie::{set_auth_cookie, set_oauth_state_cookie, take_oauth_state_cookie},
    },
    user::get_or_create_user,
};

/// The state needed for logging in.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long a new session lasts.
    pub cookie_duration: Duration,
    /// Whether cookies should only be sent over HTTPS.
    pub secure_cookies: bool,
    /// Where to send the user once they are logged in.
    pub frontend_url: String,
    /// The identity providers users can log in with.
    pub providers: IdentityProviders,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            secure_cookies: state.secure_cookies,
            frontend_url: state.frontend_url.clone(),
            providers: state.providers.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// Start logging in with `provider`.
///
/// Remembers a random `state` nonce in a private cookie and redirects to the
/// provider's authorization page.
pub async fn redirect_to_provider(
    State(state): State<LogInState>,
    Path(provider): Path<String>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), Error> {
    let provider = state.providers.get(&provider)?;
    let nonce = Uuid::new_v4().to_string();
    let authorization_url = provider.authorization_url(&nonce)?;

    tracing::debug!("Redirecting to identity provider {}", provider.name());

    Ok((
        set_oauth_state_cookie(jar, &nonce, state.secure_cookies),
        Redirect::temporary(&authorization_url),
    ))
}

/// The query an identity provider sends back to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

/// Finish logging in with `provider`.
///
/// Checks the `state` nonce, exchanges the code for the user's profile,
/// creates the user on their first log-in and starts a session.
pub async fn handle_provider_callback(
    State(state): State<LogInState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Redirect), Error> {
    let provider = state.providers.get(&provider)?;
    let (jar, expected_state) = take_oauth_state_cookie(jar);

    match (expected_state, query.state) {
        (Some(expected), Some(actual)) if expected == actual => {}
        _ => {
            tracing::warn!("OAuth state mismatch for provider {}", provider.name());
            return Err(Error::InvalidOAuthState);
        }
    }

    let code = query
        .code
        .ok_or_else(|| Error::OAuthExchange("the callback has no code".to_owned()))?;
    let profile = provider.exchange_code(&code).await?;

    let user = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;
        get_or_create_user(provider.name(), &profile, &connection)?
    };

    tracing::info!("User {} logged in with {}", user.id, provider.name());

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration, state.secure_cookies)?;

    Ok((jar, Redirect::to(&state.frontend_url)))
}
