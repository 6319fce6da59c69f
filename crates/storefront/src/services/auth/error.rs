//! Authentication error types.

use pantry_core::{EmailError, RegistrationError};
use thiserror::Error;

use crate::error::{ApiError, ErrorKind};
use crate::session::SessionError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Registration form failed validation.
    #[error("{0}")]
    Registration(#[from] RegistrationError),

    /// The service rejected the request or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session file could not be read or written.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// No token; the requested path was saved as the redirect intent.
    #[error("Please log in to continue")]
    LoginRequired,
}

impl AuthError {
    /// Whether the shopper should be sent to log in.
    #[must_use]
    pub fn is_login_required(&self) -> bool {
        match self {
            Self::LoginRequired => true,
            Self::Api(e) => e.kind() == ErrorKind::AuthRequired,
            _ => false,
        }
    }
}
