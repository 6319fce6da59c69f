//! Users and registration validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Email, EmailError, UserId};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The logged-in user, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Errors from validating a registration form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("name is required")]
    MissingName,
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// A validated registration form.
///
/// `Debug` never prints the password.
#[derive(Clone)]
pub struct Registration {
    name: String,
    email: Email,
    password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Registration {
    /// Validate the raw form fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the email is malformed, the
    /// passwords differ, or the password is shorter than
    /// [`MIN_PASSWORD_LENGTH`].
    pub fn new(
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Self, RegistrationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistrationError::MissingName);
        }
        let email = Email::parse(email)?;
        if password != confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(RegistrationError::PasswordTooShort);
        }

        Ok(Self {
            name: name.to_owned(),
            email,
            password: password.to_owned(),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn email(&self) -> &Email {
        &self.email
    }

    /// The password, for building the request body.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}
