//! The persisted login session.
//!
//! The bearer token, the logged-in user and the redirect-intent slot
//! survive between runs in a small JSON file. Nothing else about the
//! storefront is persisted locally; the cart lives on the server.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use pantry_core::{RedirectIntent, User};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A bearer token issued at login.
///
/// Implements `Debug` manually to redact the secret.
#[derive(Clone)]
pub struct AuthToken(SecretString);

impl AuthToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken([REDACTED])")
    }
}

/// Login state for one shopper.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub token: Option<AuthToken>,
    pub user: Option<User>,
    pub redirect: RedirectIntent,
}

impl Session {
    /// Whether a token is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Record a successful login.
    pub fn sign_in(&mut self, token: AuthToken, user: User) {
        self.token = Some(token);
        self.user = Some(user);
    }

    /// Forget the token and user, keeping the redirect slot.
    pub fn expire(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Forget everything, including any saved redirect.
    pub fn sign_out(&mut self) {
        self.expire();
        self.redirect.clear();
    }
}

/// On-disk shape of [`Session`].
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<User>,
    #[serde(default)]
    redirect: RedirectIntent,
}

impl From<SessionFile> for Session {
    fn from(file: SessionFile) -> Self {
        Self {
            token: file.token.map(AuthToken::new),
            user: file.user,
            redirect: file.redirect,
        }
    }
}

impl From<&Session> for SessionFile {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.as_ref().map(|t| t.expose().to_string()),
            user: session.user.clone(),
            redirect: session.redirect.clone(),
        }
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load the session; a missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Session, SessionError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let file: SessionFile = serde_json::from_str(&content)?;
                Ok(file.into())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("No session file, starting signed out");
                Ok(Session::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist the session, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self, session), fields(path = %self.path.display()))]
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&SessionFile::from(session))?;
        tokio::fs::write(&self.path, json).await?;
        restrict_permissions(&self.path).await?;
        debug!("Session saved");
        Ok(())
    }
}

/// The file holds a bearer token: keep it owner-only.
#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
