use std::sync::Arc;

use axum::http::StatusCode;
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;

use crate::{
    AppState, build_router,
    auth::{COOKIE_OAUTH_STATE, COOKIE_TOKEN, DemoProvider, IdentityProviders},
    endpoints::{self, format_provider_endpoint},
};

pub(crate) const TEST_FRONTEND_URL: &str = "http://localhost:5173";

pub(crate) fn get_test_server() -> TestServer {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let callback_url = format!(
        "http://localhost:3000{}",
        format_provider_endpoint(endpoints::AUTH_CALLBACK, DemoProvider::NAME)
    );
    let providers = IdentityProviders::new(vec![Arc::new(DemoProvider::new(&callback_url))]);
    let state = AppState::new(connection, "42", TEST_FRONTEND_URL, providers)
        .expect("Could not create app state.");

    TestServer::new(build_router(state))
}

#[track_caller]
pub(crate) fn get_location(response: &TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("Could not convert to str")
        .to_owned()
}

/// Go through the demo log-in flow and return the session cookie.
pub(crate) async fn log_in(server: &TestServer) -> Cookie<'static> {
    let response = server
        .get(&format_provider_endpoint(
            endpoints::AUTH_PROVIDER,
            DemoProvider::NAME,
        ))
        .await;
    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    let state_cookie = response.cookie(COOKIE_OAUTH_STATE);
    let location = get_location(&response);
    let (_, query) = location
        .split_once('?')
        .expect("authorization URL has no query");

    let response = server
        .get(&format!(
            "{}?{query}",
            format_provider_endpoint(endpoints::AUTH_CALLBACK, DemoProvider::NAME)
        ))
        .add_cookie(state_cookie)
        .await;
    response.assert_status_see_other();

    response.cookie(COOKIE_TOKEN)
}
