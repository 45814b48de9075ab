//! Ends the current session.

use axum::http::StatusCode;
use axum_extra::extract::PrivateCookieJar;

use crate::auth::cookie::invalidate_auth_cookie;

/// Invalidate the session cookie.
///
/// Logging out without a session is not an error.
pub async fn get_log_out(jar: PrivateCookieJar) -> (PrivateCookieJar, StatusCode) {
    (invalidate_auth_cookie(jar), StatusCode::NO_CONTENT)
}
