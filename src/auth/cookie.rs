//! Reads and writes the private session and OAuth state cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID, auth::token::Token};

/// The name of the cookie holding the encrypted session [Token].
pub const COOKIE_TOKEN: &str = "token";
/// The name of the cookie holding the OAuth `state` nonce during log-in.
pub const COOKIE_OAUTH_STATE: &str = "oauth_state";
/// How long a session lasts without any requests.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(1);
/// How long the user has to finish logging in with an identity provider.
pub(crate) const OAUTH_STATE_DURATION: Duration = Duration::minutes(10);

fn build_cookie(
    name: &'static str,
    value: String,
    expires_at: OffsetDateTime,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .expires(expires_at)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Add the session cookie for `user_id` to `jar`, valid for `duration` from now.
///
/// # Errors
/// Returns [Error::InvalidDateFormat] if the expiry overflows or
/// [Error::JSONSerializationError] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
    secure: bool,
) -> Result<PrivateCookieJar, Error> {
    let expires_at = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::InvalidDateFormat)?;

    set_token(
        jar,
        Token {
            user_id,
            expires_at,
        },
        secure,
    )
}

fn set_token(jar: PrivateCookieJar, token: Token, secure: bool) -> Result<PrivateCookieJar, Error> {
    let token_string = serde_json::to_string(&token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    Ok(jar.add(build_cookie(
        COOKIE_TOKEN,
        token_string,
        token.expires_at,
        secure,
    )))
}

/// Replace the session cookie with an expired, empty one so the browser drops it.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read and check the session token in `jar`.
///
/// # Errors
/// Returns [Error::CookieMissing] if there is no session cookie, or
/// [Error::InvalidCredentials] if the token cannot be read or has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::CookieMissing)?;
    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| Error::InvalidCredentials)?;

    if token.is_expired_at(OffsetDateTime::now_utc()) {
        return Err(Error::InvalidCredentials);
    }

    Ok(token)
}

/// Push the session expiry out to at least `duration` from now.
///
/// The expiry never moves earlier.
///
/// # Errors
/// The jar is only modified on success. See [get_token_from_cookies] and
/// [set_auth_cookie] for the error cases.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    secure: bool,
) -> Result<PrivateCookieJar, Error> {
    let token = get_token_from_cookies(&jar)?;
    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::InvalidDateFormat)?;

    set_token(
        jar,
        Token {
            user_id: token.user_id,
            expires_at: max(token.expires_at, new_expiry),
        },
        secure,
    )
}

/// Remember the OAuth `state` nonce until the identity provider redirects back.
pub(crate) fn set_oauth_state_cookie(
    jar: PrivateCookieJar,
    state: &str,
    secure: bool,
) -> PrivateCookieJar {
    let expires_at = OffsetDateTime::now_utc() + OAUTH_STATE_DURATION;

    jar.add(build_cookie(
        COOKIE_OAUTH_STATE,
        state.to_owned(),
        expires_at,
        secure,
    ))
}

/// Remove the OAuth state cookie from `jar`, returning its value if it was present.
pub(crate) fn take_oauth_state_cookie(jar: PrivateCookieJar) -> (PrivateCookieJar, Option<String>) {
    let state = jar
        .get(COOKIE_OAUTH_STATE)
        .map(|cookie| cookie.value().to_owned());

    (
        jar.remove(Cookie::build(COOKIE_OAUTH_STATE).path("/")),
        state,
    )
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, UserID,
        auth::cookie::{
            COOKIE_OAUTH_STATE, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION,
            extend_auth_cookie_duration_if_needed, get_token_from_cookies, invalidate_auth_cookie,
            set_auth_cookie, set_oauth_state_cookie, take_oauth_state_cookie,
        },
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");

        PrivateCookieJar::new(Key::from(&hash))
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(1),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[test]
    fn set_cookie_round_trips_token() {
        let jar = set_auth_cookie(get_jar(), UserID::new(3), DEFAULT_COOKIE_DURATION, true).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, UserID::new(3));
        assert_date_time_close(
            token.expires_at,
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
    }

    #[test]
    fn missing_cookie_is_reported() {
        assert_eq!(get_token_from_cookies(&get_jar()), Err(Error::CookieMissing));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jar = set_auth_cookie(get_jar(), UserID::new(3), Duration::seconds(-5), false).unwrap();

        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn extend_moves_expiry_later() {
        let jar = set_auth_cookie(get_jar(), UserID::new(3), Duration::seconds(5), false).unwrap();

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(30), false).unwrap();

        let token = get_token_from_cookies(&jar).unwrap();
        assert_date_time_close(
            token.expires_at,
            OffsetDateTime::now_utc() + Duration::minutes(30),
        );
    }

    #[test]
    fn extend_never_shortens_expiry() {
        let jar = set_auth_cookie(get_jar(), UserID::new(3), Duration::hours(2), false).unwrap();
        let before = get_token_from_cookies(&jar).unwrap().expires_at;

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5), false).unwrap();

        assert_eq!(get_token_from_cookies(&jar).unwrap().expires_at, before);
    }

    #[test]
    fn invalidated_cookie_is_not_a_session() {
        let jar = set_auth_cookie(get_jar(), UserID::new(3), DEFAULT_COOKIE_DURATION, false).unwrap();

        let jar = invalidate_auth_cookie(jar);

        let cookie = jar.get(COOKIE_TOKEN).unwrap();
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(
            get_token_from_cookies(&jar),
            Err(Error::InvalidCredentials)
        );
    }

    #[test]
    fn oauth_state_can_be_taken_once() {
        let jar = set_oauth_state_cookie(get_jar(), "nonce", false);
        assert!(jar.get(COOKIE_OAUTH_STATE).is_some());

        let (jar, state) = take_oauth_state_cookie(jar);
        assert_eq!(state.as_deref(), Some("nonce"));

        let (_, state) = take_oauth_state_cookie(jar);
        assert_eq!(state, None);
    }
}
