//! Display-ready cart data.
//!
//! Front ends render these instead of reaching into [`CartState`]: prices
//! are already formatted and pending edits are already applied.

use pantry_core::{CartLine, CartState, PendingEdits, capitalize};

/// Cart item display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub line_id: String,
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub image: Option<String>,
    /// Quantity as displayed (pending value if dirty).
    pub quantity: u32,
    /// Whether the line has an uncommitted quantity.
    pub dirty: bool,
    pub price: String,
    /// Displayed quantity times unit price.
    pub line_price: String,
    /// Stored quantity times unit price, only while the line is dirty.
    pub committed_line_price: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u64,
    pub syncing: bool,
    pub error: Option<String>,
}

impl CartView {
    /// Build from the store's state and a view's pending edits.
    #[must_use]
    pub fn new(state: &CartState, pending: &PendingEdits) -> Self {
        Self {
            items: state
                .lines
                .iter()
                .map(|line| CartItemView::new(line, pending))
                .collect(),
            subtotal: state.total().to_string(),
            item_count: state.item_count(),
            syncing: state.is_syncing,
            error: state.last_error.clone(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self::new(state, &PendingEdits::new())
    }
}

impl CartItemView {
    fn new(line: &CartLine, pending: &PendingEdits) -> Self {
        let displayed = pending.displayed(line);
        let dirty = pending.is_dirty(line);
        Self {
            line_id: line.line_id.to_string(),
            product_id: line.product_id.to_string(),
            name: line.name.clone(),
            category: capitalize(&line.category),
            image: (!line.image_ref.is_empty()).then(|| line.image_ref.clone()),
            quantity: displayed.get(),
            dirty,
            price: line.unit_price.to_string(),
            line_price: line.unit_price.times(displayed).to_string(),
            committed_line_price: dirty.then(|| line.line_total().to_string()),
        }
    }
}
