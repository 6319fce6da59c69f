//! The redirect-intent slot.
//!
//! When a shopper hits an authenticated page without a session, the page
//! they wanted is remembered here. Logging in consumes it; logging out
//! clears it.

use serde::{Deserialize, Serialize};

/// Where to go after login when nothing was saved.
pub const DEFAULT_DESTINATION: &str = "/products";

/// Paths that are never remembered as destinations.
const AUTH_PAGES: &[&str] = &["/login", "/register"];

/// A single saved destination path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectIntent(Option<String>);

impl RedirectIntent {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self(None)
    }

    /// Remember `path`, replacing anything saved before.
    ///
    /// The login and register pages are ignored so a redirect can never
    /// loop back onto the auth flow.
    pub fn save(&mut self, path: &str) {
        let path = path.trim();
        if path.is_empty() || AUTH_PAGES.contains(&path) {
            return;
        }
        self.0 = Some(path.to_owned());
    }

    /// Take the saved path, leaving the slot empty.
    ///
    /// Falls back to [`DEFAULT_DESTINATION`] when nothing was saved.
    pub fn consume(&mut self) -> String {
        self.0
            .take()
            .unwrap_or_else(|| DEFAULT_DESTINATION.to_owned())
    }

    /// Forget any saved path.
    pub fn clear(&mut self) {
        self.0 = None;
    }

    /// Whether a path is saved.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// The saved path, without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<&str> {
        self.0.as_deref()
    }
}
