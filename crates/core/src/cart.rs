//! Cart lines and the locally mirrored cart state.
//!
//! The remote service is the source of truth for cart contents. The types
//! here hold the last confirmed copy of that truth; they never patch lines
//! locally. The cart total is always derived from the lines so it cannot
//! drift from them.

use serde::{Deserialize, Serialize};

use crate::types::{LineId, Price, ProductId, Quantity};

/// One product's presence in a cart.
///
/// Product fields are a snapshot taken when the cart was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Identifier assigned by the remote service; stable across updates.
    pub line_id: LineId,
    /// The product this line holds.
    pub product_id: ProductId,
    /// Product name at fetch time.
    pub name: String,
    /// Unit price at fetch time.
    pub unit_price: Price,
    /// Product image URL.
    pub image_ref: String,
    /// Product category.
    pub category: String,
    /// Units in the cart (always at least one).
    pub quantity: Quantity,
}

impl CartLine {
    /// `unit_price * quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The client's view of the cart.
///
/// Replaced wholesale whenever the remote cart is refetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Lines in server order.
    pub lines: Vec<CartLine>,
    /// True while a fetch or mutation round-trip is outstanding.
    pub is_syncing: bool,
    /// Message from the most recent failed operation.
    pub last_error: Option<String>,
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sum of `unit_price * quantity` over every line.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity.get()))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, line_id: &LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.line_id == line_id)
    }

    /// Quantity of `product_id` in the cart, or 0 if absent.
    #[must_use]
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.product_id == product_id)
            .map_or(0, |line| line.quantity.get())
    }

    /// Replace all lines with a freshly fetched set.
    pub fn replace_lines(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build a line with the given ID, price in paise and quantity.
    pub fn line(id: &str, price_minor: i64, quantity: i64) -> CartLine {
        CartLine {
            line_id: LineId::new(id),
            product_id: ProductId::new(format!("product-{id}")),
            name: format!("Item {id}"),
            unit_price: Price::from_minor(price_minor),
            image_ref: String::new(),
            category: "pantry".to_string(),
            quantity: Quantity::new(quantity).expect("fixture quantity must be positive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::line;
    use super::*;

    #[test]
    fn test_empty_cart_totals_zero() {
        let cart = CartState::empty();
        assert_eq!(cart.total(), Price::ZERO);
        assert_eq!(cart.item_count(), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let cart = CartState {
            lines: vec![line("a", 499, 5), line("b", 349, 2)],
            ..CartState::default()
        };
        assert_eq!(cart.total(), Price::from_minor(2495 + 698));
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_total_of_out_of_range_prices_does_not_panic() {
        let mut huge = line("a", 1, 1);
        huge.unit_price = Price::new(rust_decimal::Decimal::from_i128_with_scale(
            10_000_000_000_000_000_905_969_664,
            0,
        ));
        huge.quantity = Quantity::new(10_000).expect("positive");
        let cart = CartState {
            lines: vec![huge, line("b", 499, 2)],
            ..CartState::default()
        };
        assert_eq!(cart.total(), Price::new(rust_decimal::Decimal::MAX));
    }

    #[test]
    fn test_total_follows_replaced_lines() {
        let mut cart = CartState {
            lines: vec![line("a", 1299, 3)],
            ..CartState::default()
        };
        cart.replace_lines(vec![line("b", 100, 1)]);
        assert_eq!(cart.total(), Price::from_minor(100));
    }

    #[test]
    fn test_item_quantity_by_product() {
        let cart = CartState {
            lines: vec![line("a", 499, 2)],
            ..CartState::default()
        };
        assert_eq!(cart.item_quantity(&ProductId::new("product-a")), 2);
        assert_eq!(cart.item_quantity(&ProductId::new("missing")), 0);
    }

    #[test]
    fn test_line_lookup() {
        let cart = CartState {
            lines: vec![line("a", 499, 2), line("b", 100, 1)],
            ..CartState::default()
        };
        assert_eq!(
            cart.line(&LineId::new("b")).map(|l| l.quantity.get()),
            Some(1)
        );
        assert!(cart.line(&LineId::new("z")).is_none());
    }
}
