//! Product administration commands.
//!
//! # Usage
//!
//! ```bash
//! pantry admin create --name "Greek Yogurt" --category dairy --price 6.49 \
//!     --description "Thick and creamy" --image yogurt.jpg
//! pantry admin update 64f0c2 --price 5.99
//! pantry admin delete 64f0c2
//! ```

use std::path::{Path, PathBuf};

use pantry_core::{ImageUpload, Price, ProductDraft, ProductId};
use pantry_storefront::AppState;
use rust_decimal::Decimal;

use super::{CommandError, check_auth, require_token};
use crate::render;

const ADMIN_PATH: &str = "/admin/products";

/// Fields given on the command line. `None` means "not given".
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub image: Option<PathBuf>,
}

/// `pantry admin create`
pub async fn create(state: &AppState, form: ProductForm) -> Result<(), CommandError> {
    let token = require_token(state, ADMIN_PATH).await?;

    let image = match &form.image {
        Some(path) => Some(load_image(path).await?),
        None => None,
    };
    let draft = ProductDraft {
        name: form.name.ok_or(CommandError::MissingField("name"))?,
        category: form.category.ok_or(CommandError::MissingField("category"))?,
        price: Price::new(form.price.ok_or(CommandError::MissingField("price"))?),
        description: form
            .description
            .ok_or(CommandError::MissingField("description"))?,
        image,
    };

    let result = state.catalog().create_product(&token, &draft).await;
    let product = check_auth(state, ADMIN_PATH, result).await?;
    println!("Created product {}.", product.id);
    print!("{}", render::product_detail(&product));
    Ok(())
}

/// `pantry admin update <id>`: unspecified fields keep their current value.
pub async fn update(state: &AppState, id: &str, form: ProductForm) -> Result<(), CommandError> {
    let token = require_token(state, ADMIN_PATH).await?;
    let id = ProductId::new(id);

    let result = state.catalog().product(Some(&token), &id).await;
    let existing = check_auth(state, ADMIN_PATH, result).await?;

    let mut draft = ProductDraft::from_product(&existing);
    if let Some(name) = form.name {
        draft.name = name;
    }
    if let Some(category) = form.category {
        draft.category = category;
    }
    if let Some(price) = form.price {
        draft.price = Price::new(price);
    }
    if let Some(description) = form.description {
        draft.description = description;
    }
    if let Some(path) = &form.image {
        draft.image = Some(load_image(path).await?);
    }

    let result = state.catalog().update_product(&token, &id, &draft).await;
    let product = check_auth(state, ADMIN_PATH, result).await?;
    println!("Updated product {}.", product.id);
    print!("{}", render::product_detail(&product));
    Ok(())
}

/// `pantry admin delete <id>`
pub async fn delete(state: &AppState, id: &str) -> Result<(), CommandError> {
    let token = require_token(state, ADMIN_PATH).await?;
    let id = ProductId::new(id);
    let result = state.catalog().delete_product(&token, &id).await;
    check_auth(state, ADMIN_PATH, result).await?;
    println!("Deleted product {id}.");
    Ok(())
}

async fn load_image(path: &Path) -> Result<ImageUpload, CommandError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CommandError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(ImageUpload {
        content_type: ImageUpload::content_type_for(&file_name).to_string(),
        file_name,
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_image_reads_file_and_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yogurt.png");
        tokio::fs::write(&path, b"\x89PNG").await.unwrap();

        let upload = load_image(&path).await.unwrap();

        assert_eq!(upload.file_name, "yogurt.png");
        assert_eq!(upload.content_type, "image/png");
        assert_eq!(upload.bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_load_image_missing_file() {
        let err = load_image(Path::new("/definitely/not/here.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::ReadFile { .. }));
    }
}
