//! The remote cart seam.
//!
//! [`CartStore`](super::CartStore) only talks to the cart service through
//! this trait, so tests can substitute an in-memory fake.

use std::future::Future;

use pantry_core::{CartLine, LineId, ProductId, Quantity};

use crate::error::ApiError;
use crate::session::AuthToken;

/// Remote cart operations. Every call carries the shopper's bearer token.
///
/// Mutations report only success or failure; callers refetch to learn the
/// resulting cart, since the service decides how lines merge.
pub trait CartGateway: Send + Sync {
    /// Load every line in the shopper's cart, in server order.
    fn fetch_cart(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<Vec<CartLine>, ApiError>> + Send;

    /// Add `quantity` units of a product. The service merges into an
    /// existing line for the same product.
    fn add_item(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Set a line's quantity.
    fn update_item(
        &self,
        token: &AuthToken,
        line_id: &LineId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Remove a line.
    fn delete_item(
        &self,
        token: &AuthToken,
        line_id: &LineId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Remove every line.
    fn clear_cart(&self, token: &AuthToken) -> impl Future<Output = Result<(), ApiError>> + Send;
}
