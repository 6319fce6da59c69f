//! `/cart` endpoints.

use pantry_core::{CartLine, LineId, ProductId, Quantity};
use tracing::{debug, instrument};

use super::types::{AddItemBody, CartResponse, UpdateItemBody};
use super::{ApiClient, with_token};
use crate::cart::CartGateway;
use crate::error::ApiError;
use crate::session::AuthToken;

const CART: &str = "cart";

impl CartGateway for ApiClient {
    #[instrument(skip(self, token))]
    async fn fetch_cart(&self, token: &AuthToken) -> Result<Vec<CartLine>, ApiError> {
        let request = with_token(self.get(&[CART]), Some(token));
        let response: CartResponse = Self::send_json(request, "Failed to fetch cart").await?;
        let lines = response.into_lines();
        debug!(lines = lines.len(), "Fetched cart");
        Ok(lines)
    }

    #[instrument(skip(self, token), fields(product_id = %product_id, quantity = %quantity))]
    async fn add_item(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let body = AddItemBody {
            product_id: product_id.as_str(),
            qty: quantity.get(),
        };
        let request = with_token(self.post(&[CART]), Some(token)).json(&body);
        Self::send_empty(request, "Failed to add item to cart").await
    }

    #[instrument(skip(self, token), fields(line_id = %line_id, quantity = %quantity))]
    async fn update_item(
        &self,
        token: &AuthToken,
        line_id: &LineId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        let body = UpdateItemBody { qty: quantity.get() };
        let request = with_token(self.put(&[CART, line_id.as_str()]), Some(token)).json(&body);
        Self::send_empty(request, "Failed to update cart item").await
    }

    #[instrument(skip(self, token), fields(line_id = %line_id))]
    async fn delete_item(&self, token: &AuthToken, line_id: &LineId) -> Result<(), ApiError> {
        let request = with_token(self.delete(&[CART, line_id.as_str()]), Some(token));
        Self::send_empty(request, "Failed to remove item from cart").await
    }

    #[instrument(skip(self, token))]
    async fn clear_cart(&self, token: &AuthToken) -> Result<(), ApiError> {
        let request = with_token(self.delete(&[CART]), Some(token));
        Self::send_empty(request, "Failed to clear cart").await
    }
}
