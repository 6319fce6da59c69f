//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use pantry_core::{Product, User};
use pantry_storefront::CartView;

/// One row per product: ID, name, category, price.
pub fn product_table(products: &[Product]) -> String {
    if products.is_empty() {
        return "No products found.\n".to_string();
    }

    let name_width = products
        .iter()
        .map(|p| p.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = String::new();
    for product in products {
        let _ = writeln!(
            out,
            "{id}  {name:<name_width$}  {category:<12}  {price:>10}",
            id = product.id,
            name = product.name,
            category = product.display_category(),
            price = product.price.to_string(),
        );
    }
    out
}

/// Full product detail.
pub fn product_detail(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", product.name);
    let _ = writeln!(out, "  ID:       {}", product.id);
    let _ = writeln!(out, "  Category: {}", product.display_category());
    let _ = writeln!(out, "  Price:    {}", product.price);
    if !product.image.is_empty() {
        let _ = writeln!(out, "  Image:    {}", product.image);
    }
    if let Some(updated) = product.updated_at.or(product.created_at) {
        let _ = writeln!(out, "  Updated:  {}", updated.format("%Y-%m-%d"));
    }
    if !product.description.is_empty() {
        let _ = writeln!(out, "\n{}", product.description);
    }
    out
}

/// The cart with numbered lines, as used by `cart set 2 ...`.
pub fn cart(view: &CartView) -> String {
    let mut out = String::new();
    if view.is_empty() {
        out.push_str("Your cart is empty.\n");
    } else {
        for (index, item) in view.items.iter().enumerate() {
            let marker = if item.dirty { "*" } else { " " };
            let committed = item
                .committed_line_price
                .as_ref()
                .map(|price| format!(" (was {price})"))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "{number:>3}.{marker} {name}  {quantity} x {price} = {line_price}{committed}  [{line_id}]",
                number = index + 1,
                name = item.name,
                quantity = item.quantity,
                price = item.price,
                line_price = item.line_price,
                line_id = item.line_id,
            );
        }
        let _ = writeln!(
            out,
            "\n{} item(s), subtotal {}",
            view.item_count, view.subtotal
        );
        if view.items.iter().any(|item| item.dirty) {
            out.push_str("* uncommitted quantity; run `commit` to send\n");
        }
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "! {error}");
    }
    out
}

pub fn user(user: Option<&User>) -> String {
    user.map_or_else(
        || "Not logged in.\n".to_string(),
        |u| format!("{} <{}>\n", u.name, u.email),
    )
}

#[cfg(test)]
mod tests {
    use pantry_core::{CartLine, CartState, LineId, PendingEdits, Price, ProductId, Quantity};

    use super::*;

    fn product(name: &str) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: name.to_string(),
            category: "dairy".to_string(),
            price: Price::from_minor(649),
            description: "Creamy".to_string(),
            image: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_product_table() {
        let out = product_table(&[product("Greek Yogurt")]);
        assert!(out.contains("Greek Yogurt"));
        assert!(out.contains("Dairy"));
        assert!(out.contains("₹6.49"));
        assert_eq!(product_table(&[]), "No products found.\n");
    }

    #[test]
    fn test_product_detail() {
        let out = product_detail(&product("Greek Yogurt"));
        assert!(out.starts_with("Greek Yogurt\n"));
        assert!(out.contains("Creamy"));
        assert!(!out.contains("Image:"));
    }

    #[test]
    fn test_cart_marks_dirty_lines() {
        let state = CartState {
            lines: vec![CartLine {
                line_id: LineId::new("l1"),
                product_id: ProductId::new("p1"),
                name: "Milk".to_string(),
                unit_price: Price::from_minor(300),
                image_ref: String::new(),
                category: "dairy".to_string(),
                quantity: Quantity::ONE,
            }],
            ..CartState::default()
        };
        let mut pending = PendingEdits::new();
        let _ = pending.set(&state.lines[0], 3);

        let out = cart(&CartView::new(&state, &pending));

        assert!(out.contains("  1.* Milk  3 x ₹3.00 = ₹9.00 (was ₹3.00)  [l1]"));
        assert!(out.contains("1 item(s), subtotal ₹3.00"));
        assert!(out.contains("uncommitted"));
    }

    #[test]
    fn test_empty_cart_with_error() {
        let state = CartState {
            last_error: Some("Network error".to_string()),
            ..CartState::default()
        };
        let out = cart(&CartView::from(&state));
        assert!(out.contains("Your cart is empty."));
        assert!(out.contains("! Network error"));
    }
}
