//! Catalog products, admin drafts and catalog filtering.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Price, ProductId};

/// Number of products shown on the landing page.
pub const FEATURED_COUNT: usize = 6;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Price,
    pub description: String,
    /// Image URL (may be empty).
    pub image: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Category with its first letter upper-cased, for display.
    #[must_use]
    pub fn display_category(&self) -> String {
        capitalize(&self.category)
    }
}

/// Upper-case the first character of `s`.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Errors from validating a [`ProductDraft`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("product name is required")]
    MissingName,
    #[error("product category is required")]
    MissingCategory,
    #[error("product description is required")]
    MissingDescription,
    #[error("price must be greater than zero")]
    NonPositivePrice,
}

/// An image file attached to a product form.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    /// MIME type, e.g. `image/jpeg`.
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Guess a MIME type from a file name's extension.
    #[must_use]
    pub fn content_type_for(file_name: &str) -> &'static str {
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "application/octet-stream",
        }
    }
}

/// The admin product form: used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub price: Price,
    pub description: String,
    pub image: Option<ImageUpload>,
}

impl ProductDraft {
    /// Check the draft before it is sent.
    ///
    /// # Errors
    ///
    /// Returns the first failing rule: name, category, description must be
    /// non-blank and price must be positive.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if self.category.trim().is_empty() {
            return Err(DraftError::MissingCategory);
        }
        if self.description.trim().is_empty() {
            return Err(DraftError::MissingDescription);
        }
        if !self.price.is_positive() {
            return Err(DraftError::NonPositivePrice);
        }
        Ok(())
    }

    /// Pre-fill a draft from an existing product (for editing).
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            category: product.category.clone(),
            price: product.price,
            description: product.description.clone(),
            image: None,
        }
    }
}

/// Filter applied to a product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Case-insensitive exact category match.
    pub category: Option<String>,
    /// Case-insensitive substring over name, category and description.
    pub search: Option<String>,
}

impl CatalogQuery {
    /// Whether the query filters anything.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.category.is_none() && self.search.is_none()
    }

    /// Whether `product` passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|c| product.category.eq_ignore_ascii_case(c.trim()));

        let search_ok = self.search.as_deref().is_none_or(|term| {
            let term = term.trim().to_lowercase();
            term.is_empty()
                || [&product.name, &product.category, &product.description]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
        });

        category_ok && search_ok
    }

    /// Apply the filter, keeping server order.
    #[must_use]
    pub fn apply(&self, products: &[Product]) -> Vec<Product> {
        products
            .iter()
            .filter(|p| self.matches(p))
            .cloned()
            .collect()
    }
}

/// The first [`FEATURED_COUNT`] products, in server order.
#[must_use]
pub fn featured(products: &[Product]) -> &[Product] {
    products.get(..FEATURED_COUNT).unwrap_or(products)
}

/// Distinct categories, lower-cased and sorted.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.category.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
