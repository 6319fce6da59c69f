//! `/user` endpoints.

use pantry_core::{Registration, User};
use tracing::{info, instrument, warn};

use super::ApiClient;
use super::types::{LoginBody, LoginResponse, MessageResponse, RegisterBody};
use crate::error::ApiError;
use crate::session::AuthToken;

const USER: &str = "user";

/// A token and the user it belongs to.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub token: AuthToken,
    pub user: User,
}

impl ApiClient {
    /// Exchange email and password for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns the server's message on rejection, or a rejection if the
    /// success body lacks a token or user.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Credentials, ApiError> {
        let request = self.post(&[USER, "login"]).json(&LoginBody { email, password });
        let response: LoginResponse = Self::send_json(request, "Login failed").await?;

        match (response.token, response.user) {
            (Some(token), Some(user)) if !token.is_empty() => {
                info!(user_id = %user.id, "Logged in");
                Ok(Credentials {
                    token: AuthToken::new(token),
                    user: user.into(),
                })
            }
            _ => {
                warn!(message = ?response.message, "Login response missing token or user");
                Err(ApiError::Rejected {
                    status: 200,
                    message: "Unexpected response structure from server".to_string(),
                })
            }
        }
    }

    /// Create an account. Does not log in.
    ///
    /// Returns the server's confirmation message, if any.
    ///
    /// # Errors
    ///
    /// Returns the server's message on rejection.
    #[instrument(skip(self, registration), fields(email = %registration.email()))]
    pub async fn register(&self, registration: &Registration) -> Result<Option<String>, ApiError> {
        let body = RegisterBody {
            name: registration.name(),
            email: registration.email().as_str(),
            password: registration.password(),
            confirm_password: registration.password(),
        };
        let request = self.post(&[USER, "register"]).json(&body);
        let body = Self::send(request, "Registration failed").await?;
        info!("Registered");
        Ok(serde_json::from_str::<MessageResponse>(&body)
            .ok()
            .and_then(|m| m.message))
    }
}
