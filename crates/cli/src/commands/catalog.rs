//! Catalog browsing commands.

use pantry_core::{CatalogQuery, ProductId};
use pantry_storefront::AppState;

use super::{CommandError, check_auth};
use crate::render;

const PRODUCTS_PATH: &str = "/products";

/// `pantry products [--category] [--search]`
pub async fn products(
    state: &AppState,
    category: Option<String>,
    search: Option<String>,
) -> Result<(), CommandError> {
    let token = state.auth().token().await;
    let query = CatalogQuery { category, search };
    let result = state.catalog().products(token.as_ref(), &query).await;
    let products = check_auth(state, PRODUCTS_PATH, result).await?;
    print!("{}", render::product_table(&products));
    Ok(())
}

/// `pantry featured`
pub async fn featured(state: &AppState) -> Result<(), CommandError> {
    let token = state.auth().token().await;
    let result = state.catalog().featured(token.as_ref()).await;
    let products = check_auth(state, "/", result).await?;
    print!("{}", render::product_table(&products));
    Ok(())
}

/// `pantry categories`
pub async fn categories(state: &AppState) -> Result<(), CommandError> {
    let token = state.auth().token().await;
    let result = state.catalog().categories(token.as_ref()).await;
    for category in check_auth(state, PRODUCTS_PATH, result).await? {
        println!("{category}");
    }
    Ok(())
}

/// `pantry product <id>`
pub async fn product(state: &AppState, id: &str) -> Result<(), CommandError> {
    let token = state.auth().token().await;
    let path = format!("{PRODUCTS_PATH}/{id}");
    let result = state.catalog().product(token.as_ref(), &ProductId::new(id)).await;
    let product = check_auth(state, &path, result).await?;
    print!("{}", render::product_detail(&product));

    if state.cart().has_token() {
        // Best effort: the product prints either way.
        let _ = state.cart().fetch().await;
    }
    let in_cart = state.cart().item_quantity(&product.id);
    if in_cart > 0 {
        println!("\nIn your cart: {in_cart}");
    }
    Ok(())
}
