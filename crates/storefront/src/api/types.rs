//! Wire types for the REST service and their conversions to domain types.
//!
//! The service speaks Mongo-flavoured JSON: `_id` keys, camelCase fields,
//! prices as JSON numbers. Everything here is private to the API layer;
//! callers only ever see `pantry_core` types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pantry_core::{CartLine, LineId, Price, Product, ProductId, Quantity, User, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// Responses
// =============================================================================

/// `GET /cart`
///
/// Older deployments put the lines under `data`, newer ones under
/// `cartItems`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(default)]
    pub cart_items: Option<Vec<WireCartItem>>,
    #[serde(default)]
    pub data: Option<Vec<WireCartItem>>,
}

impl CartResponse {
    pub fn into_lines(self) -> Vec<CartLine> {
        self.cart_items
            .or(self.data)
            .unwrap_or_default()
            .into_iter()
            .filter_map(WireCartItem::into_line)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCartItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub product_id: WireProductRef,
    pub qty: i64,
}

/// The product reference on a cart item: populated by the server, or a bare
/// id when population failed (e.g. the product was deleted).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireProductRef {
    Populated(Box<WireProduct>),
    Id(String),
}

impl WireCartItem {
    /// Convert to a [`CartLine`], dropping lines the UI cannot render.
    fn into_line(self) -> Option<CartLine> {
        let Some(quantity) = Quantity::new(self.qty) else {
            warn!(line_id = %self.id, qty = self.qty, "Dropping cart line with non-positive quantity");
            return None;
        };
        let product = match self.product_id {
            WireProductRef::Populated(product) => *product,
            WireProductRef::Id(product_id) => {
                warn!(line_id = %self.id, product_id = %product_id, "Dropping cart line without product details");
                return None;
            }
        };

        Some(CartLine {
            line_id: LineId::new(self.id),
            product_id: ProductId::new(product.id),
            name: product.name,
            unit_price: price_from_wire(product.price),
            image_ref: product.image,
            category: product.category,
            quantity,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireProduct {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<WireProduct> for Product {
    fn from(wire: WireProduct) -> Self {
        Self {
            id: ProductId::new(wire.id),
            name: wire.name,
            category: wire.category,
            price: price_from_wire(wire.price),
            description: wire.description,
            image: wire.image,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

/// `POST /user/login`
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<WireUser> for User {
    fn from(wire: WireUser) -> Self {
        Self {
            id: UserId::new(wire.id),
            name: wire.name,
            email: wire.email,
        }
    }
}

/// Any response whose only interesting field is `message`.
#[derive(Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Request bodies
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody<'a> {
    pub product_id: &'a str,
    pub qty: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateItemBody {
    pub qty: u32,
}

#[derive(Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// JSON numbers arrive as `f64`; go through the shortest decimal
/// representation so `4.99` stays `4.99`.
fn price_from_wire(value: f64) -> Price {
    if !value.is_finite() {
        warn!(value, "Non-finite price from server, treating as zero");
        return Price::ZERO;
    }
    Decimal::from_str(&value.to_string())
        .or_else(|_| Decimal::from_scientific(&format!("{value:e}")))
        .map(Price::from)
        .unwrap_or_else(|e| {
            warn!(value, error = %e, "Unrepresentable price from server, treating as zero");
            Price::ZERO
        })
}
