//! `/product` endpoints: public catalog reads and admin writes.

use pantry_core::{Product, ProductDraft, ProductId};
use reqwest::multipart::{Form, Part};
use tracing::{debug, instrument};

use super::types::WireProduct;
use super::{ApiClient, with_token};
use crate::error::ApiError;
use crate::session::AuthToken;

const PRODUCT: &str = "product";

impl ApiClient {
    /// Every product, in server order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a product
    /// array.
    #[instrument(skip(self, token))]
    pub async fn list_products(&self, token: Option<&AuthToken>) -> Result<Vec<Product>, ApiError> {
        let request = with_token(self.get(&[PRODUCT]), token);
        let products: Vec<WireProduct> =
            Self::send_json(request, "Failed to fetch products").await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products.into_iter().map(Product::from).collect())
    }

    /// One product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn get_product(
        &self,
        token: Option<&AuthToken>,
        id: &ProductId,
    ) -> Result<Product, ApiError> {
        let request = with_token(self.get(&[PRODUCT, id.as_str()]), token);
        let product: WireProduct = Self::send_json(request, "Failed to fetch product").await?;
        Ok(product.into())
    }

    /// Create a product from a validated draft.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft is incomplete, otherwise any
    /// request failure.
    #[instrument(skip(self, token, draft), fields(name = %draft.name))]
    pub async fn create_product(
        &self,
        token: &AuthToken,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        draft.validate()?;
        let request = with_token(self.post(&[PRODUCT]), Some(token)).multipart(draft_form(draft)?);
        let product: WireProduct = Self::send_json(request, "Failed to create product").await?;
        Ok(product.into())
    }

    /// Replace a product's fields (and optionally its image).
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft is incomplete, otherwise any
    /// request failure.
    #[instrument(skip(self, token, draft), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        token: &AuthToken,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, ApiError> {
        draft.validate()?;
        let request =
            with_token(self.put(&[PRODUCT, id.as_str()]), Some(token)).multipart(draft_form(draft)?);
        let product: WireProduct = Self::send_json(request, "Failed to update product").await?;
        Ok(product.into())
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn delete_product(&self, token: &AuthToken, id: &ProductId) -> Result<(), ApiError> {
        let request = with_token(self.delete(&[PRODUCT, id.as_str()]), Some(token));
        Self::send_empty(request, "Failed to delete product").await
    }
}

/// The multipart body shared by create and update.
fn draft_form(draft: &ProductDraft) -> Result<Form, ApiError> {
    let form = Form::new()
        .text("name", draft.name.trim().to_string())
        .text("category", draft.category.trim().to_string())
        .text("price", draft.price.amount().normalize().to_string())
        .text("description", draft.description.trim().to_string());

    let Some(image) = &draft.image else {
        return Ok(form);
    };
    let part = Part::bytes(image.bytes.clone())
        .file_name(image.file_name.clone())
        .mime_str(&image.content_type)
        .map_err(|e| ApiError::Validation(format!("Invalid image content type: {e}")))?;
    Ok(form.part("image", part))
}
