//! OAuth log-in, the private session cookie and the middleware that guards protected routes.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod provider;
mod token;

pub use cookie::{
    COOKIE_OAUTH_STATE, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, invalidate_auth_cookie,
    set_auth_cookie,
};
pub use log_in::{LogInState, handle_provider_callback, redirect_to_provider};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard};
pub use provider::{DemoProvider, IdentityProvider, IdentityProviders, ProviderUser};
