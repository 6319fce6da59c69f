//! Authentication service.
//!
//! Owns the persisted [`Session`]: login stores the token and user, logout
//! forgets them, and auth-gated paths park themselves in the redirect-intent
//! slot so login can send the shopper back where they were going.

mod error;

pub use error::AuthError;

use pantry_core::{Email, Registration, User};
use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::error::{ApiError, add_breadcrumb};
use crate::session::{AuthToken, Session, SessionStore};

/// A completed login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub user: User,
    /// Where to go next: the saved redirect intent, or the product listing.
    pub destination: String,
}

/// Authentication service.
///
/// Every change to the session is written through to the session file.
#[derive(Debug)]
pub struct AuthService {
    api: ApiClient,
    store: SessionStore,
    session: Mutex<Session>,
}

impl AuthService {
    /// Load the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session file exists but is
    /// unreadable.
    pub async fn load(api: ApiClient, store: SessionStore) -> Result<Self, AuthError> {
        let session = store.load().await?;
        Ok(Self {
            api,
            store,
            session: Mutex::new(session),
        })
    }

    /// The bearer token, if logged in.
    pub async fn token(&self) -> Option<AuthToken> {
        self.session.lock().await.token.clone()
    }

    /// The logged-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.session.lock().await.user.clone()
    }

    /// The saved redirect intent, if any.
    pub async fn pending_redirect(&self) -> Option<String> {
        self.session.lock().await.redirect.peek().map(str::to_owned)
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Log in with email and password.
    ///
    /// On success the token and user are persisted and the redirect intent is
    /// consumed into [`LoginSuccess::destination`].
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed email, `AuthError::Api`
    /// if the service refuses the credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginSuccess, AuthError> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()).into());
        }

        let credentials = self.api.login(email.as_str(), password).await?;

        let mut session = self.session.lock().await;
        let user = credentials.user.clone();
        let destination = self
            .commit(&mut session, |next| {
                next.sign_in(credentials.token, user);
                next.redirect.consume()
            })
            .await?;

        add_breadcrumb("auth", "Logged in", Some(&[("destination", destination.as_str())]));
        info!(destination = %destination, "Login complete");
        Ok(LoginSuccess {
            user: credentials.user,
            destination,
        })
    }

    /// Create an account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Api` if the service rejects the registration.
    #[instrument(skip(self, registration), fields(email = %registration.email()))]
    pub async fn register(&self, registration: &Registration) -> Result<Option<String>, AuthError> {
        Ok(self.api.register(registration).await?)
    }

    /// Forget the token, user and any saved redirect.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session file cannot be written.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        let mut session = self.session.lock().await;
        self.commit(&mut session, Session::sign_out).await?;
        add_breadcrumb("auth", "Logged out", None);
        info!("Logged out");
        Ok(())
    }

    /// The token for an auth-gated `path`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::LoginRequired` after saving `path` as the redirect
    /// intent when nobody is logged in.
    #[instrument(skip(self))]
    pub async fn require_auth(&self, path: &str) -> Result<AuthToken, AuthError> {
        let mut session = self.session.lock().await;
        if let Some(token) = session.token.clone() {
            return Ok(token);
        }
        self.commit(&mut session, |next| next.redirect.save(path))
            .await?;
        Err(AuthError::LoginRequired)
    }

    /// The service refused our token while at `path`: drop it and remember
    /// where to return after logging in again.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Session` if the session file cannot be written.
    #[instrument(skip(self))]
    pub async fn session_expired(&self, path: &str) -> Result<(), AuthError> {
        let mut session = self.session.lock().await;
        self.commit(&mut session, |next| {
            next.expire();
            next.redirect.save(path);
        })
        .await?;
        add_breadcrumb("auth", "Session expired", Some(&[("path", path)]));
        Ok(())
    }

    /// Apply `change` to a copy of the session and adopt it only once the
    /// copy is saved, so a failed write leaves memory and disk in agreement.
    async fn commit<T>(
        &self,
        session: &mut Session,
        change: impl FnOnce(&mut Session) -> T,
    ) -> Result<T, AuthError> {
        let mut next = session.clone();
        let result = change(&mut next);
        self.store.save(&next).await?;
        *session = next;
        Ok(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::PantryConfig;

    async fn service(dir: &tempfile::TempDir) -> AuthService {
        let path: PathBuf = dir.path().join("session.json");
        // Nothing listens on port 9; these tests never reach the network.
        let config = PantryConfig::for_base_url("http://127.0.0.1:9", path.clone()).unwrap();
        let api = ApiClient::new(&config).unwrap();
        AuthService::load(api, SessionStore::new(path)).await.unwrap()
    }

    #[tokio::test]
    async fn test_require_auth_saves_intent() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(&dir).await;

        let err = auth.require_auth("/cart").await.unwrap_err();

        assert!(err.is_login_required());
        assert_eq!(auth.pending_redirect().await.as_deref(), Some("/cart"));

        // Persisted for the next run.
        let reloaded = service(&dir).await;
        assert_eq!(reloaded.pending_redirect().await.as_deref(), Some("/cart"));
    }

    #[tokio::test]
    async fn test_login_validates_before_request() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(&dir).await;

        assert!(matches!(
            auth.login("not-an-email", "secret1").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.login("a@b.c", "").await,
            Err(AuthError::Api(ApiError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_unsaved_change_is_not_kept() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(&dir).await;
        // A directory where the file should be makes every save fail.
        std::fs::create_dir(dir.path().join("session.json")).unwrap();

        let err = auth.require_auth("/cart").await.unwrap_err();

        assert!(matches!(err, AuthError::Session(_)));
        assert!(auth.pending_redirect().await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_intent() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(&dir).await;
        let _ = auth.require_auth("/cart").await;

        auth.logout().await.unwrap();

        assert!(auth.pending_redirect().await.is_none());
        assert!(auth.token().await.is_none());
    }
}
