//! Pantry Palace Storefront client library.
//!
//! Everything a storefront front end needs to talk to the Pantry Palace
//! REST service: the HTTP client, the cart store and its pending-edit
//! editor, the cached catalog, and the persisted auth session.
//!
//! # Architecture
//!
//! - The remote service is the source of truth - the cart is refetched after
//!   every mutation, never patched locally
//! - One [`state::AppState`] is built per session and handed to consumers
//! - Products are cached in memory via `moka`; cart data is never cached

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod state;

pub use api::{ApiClient, Credentials};
pub use cart::{
    CartEditor, CartGateway, CartItemView, CartStore, CartView, EditResult, SyncOutcome,
};
pub use config::{ConfigError, PantryConfig};
pub use error::{ApiError, ErrorKind};
pub use services::{AuthError, AuthService, Catalog, LoginSuccess};
pub use session::{AuthToken, Session, SessionError, SessionStore};
pub use state::{AppState, StateError};
