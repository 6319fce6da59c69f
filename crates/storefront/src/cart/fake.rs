//! In-memory cart service for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;

use pantry_core::{CartLine, LineId, Price, ProductId, Quantity};

use super::CartGateway;
use crate::error::ApiError;
use crate::session::AuthToken;

pub fn token() -> AuthToken {
    AuthToken::new("test-token")
}

/// Failure to inject for an operation until healed.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Network,
    Rejected(&'static str),
    Unauthorized,
}

impl Failure {
    async fn into_error(self) -> ApiError {
        match self {
            // reqwest errors have no public constructor; an unparseable URL
            // yields one without touching the network.
            Self::Network => reqwest::get("not a url").await.unwrap_err().into(),
            Self::Rejected(message) => ApiError::Rejected {
                status: 400,
                message: message.to_string(),
            },
            Self::Unauthorized => ApiError::login_required(),
        }
    }
}

#[derive(Default)]
struct Inner {
    lines: Vec<CartLine>,
    catalog: HashMap<ProductId, (String, Price)>,
    failures: HashMap<&'static str, Failure>,
    calls: Vec<String>,
    next_line: u32,
}

/// Merges adds by product like the real service and records every call.
#[derive(Default)]
pub struct FakeGateway {
    inner: Mutex<Inner>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `product_id` addable.
    pub fn with_product(self, product_id: &str, name: &str, price_minor: i64) -> Self {
        self.inner.lock().unwrap().catalog.insert(
            ProductId::new(product_id),
            (name.to_string(), Price::from_minor(price_minor)),
        );
        self
    }

    /// Seed a line already in the remote cart.
    pub fn with_line(self, line_id: &str, product_id: &str, price_minor: i64, qty: i64) -> Self {
        let this = self.with_product(product_id, product_id, price_minor);
        this.inner.lock().unwrap().lines.push(CartLine {
            line_id: LineId::new(line_id),
            product_id: ProductId::new(product_id),
            name: product_id.to_string(),
            unit_price: Price::from_minor(price_minor),
            image_ref: String::new(),
            category: "pantry".to_string(),
            quantity: Quantity::new(qty).unwrap(),
        });
        this
    }

    /// Fail `operation` ("fetch", "add", "update", "delete", "clear").
    pub fn fail(&self, operation: &'static str, failure: Failure) {
        self.inner.lock().unwrap().failures.insert(operation, failure);
    }

    pub fn heal(&self, operation: &'static str) {
        self.inner.lock().unwrap().failures.remove(operation);
    }

    /// Calls received so far, e.g. `["fetch", "update a 5", "fetch"]`.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Calls other than fetches.
    pub fn mutations(&self) -> Vec<String> {
        self.calls().into_iter().filter(|c| c != "fetch").collect()
    }

    /// Record the call and return the injected failure, if any.
    fn enter(&self, operation: &'static str, call: String) -> Option<Failure> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        inner.failures.get(operation).copied()
    }
}

impl CartGateway for FakeGateway {
    async fn fetch_cart(&self, _token: &AuthToken) -> Result<Vec<CartLine>, ApiError> {
        if let Some(failure) = self.enter("fetch", "fetch".to_string()) {
            return Err(failure.into_error().await);
        }
        Ok(self.inner.lock().unwrap().lines.clone())
    }

    async fn add_item(
        &self,
        _token: &AuthToken,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        if let Some(failure) = self.enter("add", format!("add {product_id} {quantity}")) {
            return Err(failure.into_error().await);
        }
        let mut inner = self.inner.lock().unwrap();
        if let Some(line) = inner.lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = Quantity::new(i64::from(line.quantity) + i64::from(quantity)).unwrap();
            return Ok(());
        }
        let Some((name, price)) = inner.catalog.get(product_id).cloned() else {
            return Err(ApiError::Rejected {
                status: 404,
                message: "Product not found".to_string(),
            });
        };
        inner.next_line += 1;
        let line_id = LineId::new(format!("line-{}", inner.next_line));
        inner.lines.push(CartLine {
            line_id,
            product_id: product_id.clone(),
            name,
            unit_price: price,
            image_ref: String::new(),
            category: "pantry".to_string(),
            quantity,
        });
        Ok(())
    }

    async fn update_item(
        &self,
        _token: &AuthToken,
        line_id: &LineId,
        quantity: Quantity,
    ) -> Result<(), ApiError> {
        if let Some(failure) = self.enter("update", format!("update {line_id} {quantity}")) {
            return Err(failure.into_error().await);
        }
        let mut inner = self.inner.lock().unwrap();
        match inner.lines.iter_mut().find(|l| &l.line_id == line_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(ApiError::Rejected {
                status: 404,
                message: "Cart item not found".to_string(),
            }),
        }
    }

    async fn delete_item(&self, _token: &AuthToken, line_id: &LineId) -> Result<(), ApiError> {
        if let Some(failure) = self.enter("delete", format!("delete {line_id}")) {
            return Err(failure.into_error().await);
        }
        self.inner
            .lock()
            .unwrap()
            .lines
            .retain(|l| &l.line_id != line_id);
        Ok(())
    }

    async fn clear_cart(&self, _token: &AuthToken) -> Result<(), ApiError> {
        if let Some(failure) = self.enter("clear", "clear".to_string()) {
            return Err(failure.into_error().await);
        }
        self.inner.lock().unwrap().lines.clear();
        Ok(())
    }
}
