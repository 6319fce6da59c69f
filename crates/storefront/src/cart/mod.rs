//! Cart state management.
//!
//! # Architecture
//!
//! - The remote service owns the cart; [`CartStore`] mirrors it and refetches
//!   after every confirmed mutation.
//! - [`CartEditor`] buffers quantity edits per view until committed.
//! - [`CartGateway`] is the seam to the remote service, implemented by
//!   [`ApiClient`](crate::ApiClient).

mod editor;
mod gateway;
mod store;
mod view;

#[cfg(test)]
mod fake;

pub use editor::{CartEditor, EditResult};
pub use gateway::CartGateway;
pub use store::{CartStore, SyncOutcome};
pub use view::{CartItemView, CartView};
