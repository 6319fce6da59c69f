//! Application state shared across a storefront session.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::config::PantryConfig;
use crate::error::ApiError;
use crate::services::{AuthError, AuthService, Catalog, LoginSuccess};
use crate::session::SessionStore;

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not create HTTP client: {0}")]
    Client(#[from] ApiError),
    #[error("could not load session: {0}")]
    Auth(#[from] AuthError),
}

/// Application state shared across a session.
///
/// This struct is cheaply cloneable via `Arc` and is built once per session,
/// then handed to every consumer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PantryConfig,
    api: ApiClient,
    catalog: Catalog,
    auth: AuthService,
    cart: CartStore<ApiClient>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("api", &self.inner.api)
            .field("cart", &self.inner.cart)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create the state: HTTP client, catalog cache, persisted session and
    /// an empty cart carrying the session's token.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file is unreadable.
    pub async fn new(config: PantryConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config)?;
        let catalog = Catalog::new(api.clone(), config.catalog_cache_ttl);
        let auth = AuthService::load(api.clone(), SessionStore::new(config.session_file.clone()))
            .await?;
        let cart = CartStore::new(api.clone(), auth.token().await);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                catalog,
                auth,
                cart,
            }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &PantryConfig {
        &self.inner.config
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Get a reference to the auth service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<ApiClient> {
        &self.inner.cart
    }

    /// Log in and hand the new token to the cart.
    ///
    /// # Errors
    ///
    /// See [`AuthService::login`].
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let success = self.inner.auth.login(email, password).await?;
        self.inner.cart.set_token(self.inner.auth.token().await);
        Ok(success)
    }

    /// Log out and discard the local cart.
    ///
    /// # Errors
    ///
    /// See [`AuthService::logout`].
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.inner.auth.logout().await?;
        self.inner.cart.set_token(None);
        Ok(())
    }

    /// The service refused the token while at `path`.
    ///
    /// # Errors
    ///
    /// See [`AuthService::session_expired`].
    pub async fn session_expired(&self, path: &str) -> Result<(), AuthError> {
        self.inner.auth.session_expired(path).await?;
        self.inner.cart.set_token(None);
        Ok(())
    }
}
