//! Identity providers that users can log in with.
//!
//! The OAuth code exchange is owned by each provider. The crate ships
//! [DemoProvider] for the demo account; real providers plug in through
//! [IdentityProvider].

use std::{collections::HashMap, fmt::Debug, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The profile an identity provider returns for a logged-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    /// The user's ID at the provider. Unique per provider.
    pub provider_id: String,
    /// The display name.
    pub username: String,
    /// The email address.
    pub email: String,
    /// A URL to the user's profile picture.
    pub avatar: Option<String>,
}

/// An OAuth identity provider.
#[async_trait]
pub trait IdentityProvider: Debug + Send + Sync {
    /// The name used in the log-in routes, e.g. "google".
    fn name(&self) -> &str;

    /// The URL to send the user to so they can log in.
    ///
    /// The provider must pass `state` back unchanged to the callback.
    fn authorization_url(&self, state: &str) -> Result<String, Error>;

    /// Exchange an authorization code for the user's profile.
    ///
    /// # Errors
    /// Returns [Error::OAuthExchange] if the provider rejects the code.
    async fn exchange_code(&self, code: &str) -> Result<ProviderUser, Error>;
}

/// A provider that logs everyone in as the same demo user without leaving the site.
#[derive(Debug, Clone)]
pub struct DemoProvider {
    callback_url: String,
}

impl DemoProvider {
    /// The name of the demo provider in the log-in routes.
    pub const NAME: &'static str = "demo";
    const CODE: &'static str = "demo";

    /// Create a demo provider that redirects straight to `callback_url`.
    pub fn new(callback_url: &str) -> Self {
        Self {
            callback_url: callback_url.to_owned(),
        }
    }

    fn demo_user() -> ProviderUser {
        ProviderUser {
            provider_id: "demo".to_owned(),
            username: "Demo User".to_owned(),
            email: "demo@example.com".to_owned(),
            avatar: None,
        }
    }
}

#[async_trait]
impl IdentityProvider for DemoProvider {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn authorization_url(&self, state: &str) -> Result<String, Error> {
        let query = serde_urlencoded::to_string([("code", Self::CODE), ("state", state)])
            .map_err(|error| Error::OAuthExchange(error.to_string()))?;

        Ok(format!("{}?{query}", self.callback_url))
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderUser, Error> {
        if code != Self::CODE {
            return Err(Error::OAuthExchange(format!(
                "the demo provider does not accept the code \"{code}\""
            )));
        }

        Ok(Self::demo_user())
    }
}

/// The identity providers registered with the server, by name.
#[derive(Debug, Clone, Default)]
pub struct IdentityProviders {
    providers: Arc<HashMap<String, Arc<dyn IdentityProvider>>>,
}

impl IdentityProviders {
    /// Register `providers` under their [IdentityProvider::name].
    pub fn new(providers: Vec<Arc<dyn IdentityProvider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.name().to_owned(), provider))
            .collect();

        Self {
            providers: Arc::new(providers),
        }
    }

    /// Look up a provider by name.
    ///
    /// # Errors
    /// Returns [Error::UnknownProvider] if no provider has that name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn IdentityProvider>, Error> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProvider(name.to_owned()))
    }

    /// Whether no providers are registered.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
