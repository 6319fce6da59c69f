//! Services layered over the API client.
//!
//! # Services
//!
//! - `catalog` - Cached product listing and detail, plus admin writes that
//!   invalidate the cache
//! - `auth` - Login, registration, logout and the persisted session

pub mod auth;
pub mod catalog;

pub use auth::{AuthError, AuthService, LoginSuccess};
pub use catalog::Catalog;
