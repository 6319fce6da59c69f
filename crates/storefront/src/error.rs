//! Unified error handling for calls to the Pantry Palace service.
//!
//! Every request failure becomes an [`ApiError`]. Front ends mostly care
//! about which bucket an error falls into ([`ErrorKind`]) and the message to
//! show, which for server rejections is the server's own `message` field.

use pantry_core::DraftError;
use thiserror::Error;

/// Message shown when the service demands a login without explaining why.
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to continue";

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached the service or the response never arrived.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-provided message (or a fallback describing the request).
        message: String,
    },

    /// The token is missing, expired, or was refused (401/403).
    #[error("{0}")]
    Unauthorized(String),

    /// Input was rejected before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// A success response whose body could not be understood.
    #[error("Unexpected response from server: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Error taxonomy exposed to front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request never reached or never returned.
    NetworkFailure,
    /// Non-2xx with a message, or an unusable body.
    ServerRejection,
    /// Blocked client-side before dispatch.
    ValidationFailure,
    /// Login needed; front ends route this to the redirect-intent flow.
    AuthRequired,
}

impl ApiError {
    /// Which bucket of the taxonomy this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) => ErrorKind::NetworkFailure,
            Self::Rejected { .. } | Self::Parse(_) => ErrorKind::ServerRejection,
            Self::Unauthorized(_) => ErrorKind::AuthRequired,
            Self::Validation(_) => ErrorKind::ValidationFailure,
        }
    }

    /// A login-required error with the default message.
    #[must_use]
    pub fn login_required() -> Self {
        Self::Unauthorized(LOGIN_REQUIRED_MESSAGE.to_string())
    }
}

impl From<DraftError> for ApiError {
    fn from(err: DraftError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error. A no-op when Sentry is not initialized.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Quantity update failed", Some(&[("line_id", "64f0c1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_shows_server_message_verbatim() {
        let err = ApiError::Rejected {
            status: 400,
            message: "Product out of stock".to_string(),
        };
        assert_eq!(err.to_string(), "Product out of stock");
        assert_eq!(err.kind(), ErrorKind::ServerRejection);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(ApiError::login_required().kind(), ErrorKind::AuthRequired);
        assert_eq!(
            ApiError::Validation("bad".to_string()).kind(),
            ErrorKind::ValidationFailure
        );
        let parse = serde_json::from_str::<u32>("nope").expect_err("invalid json");
        assert_eq!(ApiError::from(parse).kind(), ErrorKind::ServerRejection);
    }

    #[test]
    fn test_validation_conversions() {
        let err = ApiError::from(DraftError::NonPositivePrice);
        assert_eq!(err.to_string(), "price must be greater than zero");
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }
}
