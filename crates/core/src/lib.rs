//! Pantry Palace Core - domain types for the grocery storefront client.
//!
//! This crate is shared by:
//! - `storefront` - REST client, cart store and session handling
//! - `cli` - the `pantry` command-line storefront
//! - `integration-tests` - the mock API server and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure state machines - no I/O, no
//! HTTP clients, no async. Everything here can be driven synchronously from
//! tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, quantities and emails
//! - [`cart`] - Cart lines and the derived cart state
//! - [`pending`] - Uncommitted quantity edits layered over the cart
//! - [`redirect`] - The post-login redirect-intent slot
//! - [`product`] - Catalog products, admin drafts and catalog filtering
//! - [`account`] - Users and registration validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod cart;
pub mod pending;
pub mod product;
pub mod redirect;
pub mod types;

pub use account::{Registration, RegistrationError, User};
pub use cart::{CartLine, CartState};
pub use pending::{EditAction, PendingCommit, PendingEdits};
pub use product::{
    CatalogQuery, DraftError, FEATURED_COUNT, ImageUpload, Product, ProductDraft, capitalize,
};
pub use redirect::RedirectIntent;
pub use types::*;
