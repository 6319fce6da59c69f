//! End-to-end test support for the Pantry Palace client.
//!
//! [`MockServer`] is an in-process stand-in for the REST service. It speaks
//! the same wire format (`_id` fields, populated `productId` on cart lines,
//! `{ "message": ... }` error bodies, bearer tokens) and keeps everything in
//! memory, so the tests under `tests/` can drive the real `ApiClient`,
//! `CartStore`, `Catalog` and `AuthService` over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pantry-integration-tests
//! ```
//!
//! # Routes
//!
//! ```text
//! POST   /api/user/register
//! POST   /api/user/login
//! GET    /api/product            (public)
//! GET    /api/product/{id}       (public)
//! POST   /api/product            (bearer, multipart)
//! PUT    /api/product/{id}       (bearer, multipart)
//! DELETE /api/product/{id}       (bearer)
//! GET    /api/cart               (bearer)
//! POST   /api/cart               (bearer, merges by product)
//! DELETE /api/cart               (bearer)
//! PUT    /api/cart/{id}          (bearer)
//! DELETE /api/cart/{id}          (bearer)
//! ```

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Multipart, Path as UrlPath, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use pantry_storefront::{AppState, PantryConfig};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;

// =============================================================================
// In-memory data
// =============================================================================

#[derive(Debug, Clone)]
struct MockProduct {
    id: String,
    name: String,
    category: String,
    price: f64,
    description: String,
    image: String,
}

impl MockProduct {
    fn to_json(&self) -> Value {
        json!({
            "_id": self.id,
            "name": self.name,
            "category": self.category,
            "price": self.price,
            "description": self.description,
            "image": self.image,
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-02T10:00:00.000Z",
        })
    }
}

#[derive(Debug, Clone)]
struct MockLine {
    id: String,
    product_id: String,
    qty: i64,
}

#[derive(Debug, Clone)]
struct MockUser {
    id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct Store {
    products: Vec<MockProduct>,
    users: Vec<MockUser>,
    /// token -> user id
    tokens: HashMap<String, String>,
    /// user id -> cart lines
    carts: HashMap<String, Vec<MockLine>>,
    /// "METHOD /path" -> one-shot failure
    failures: HashMap<String, (StatusCode, Option<String>)>,
    requests: Vec<String>,
    next_id: u32,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn product(&self, id: &str) -> Option<&MockProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    fn cart_json(&self, user_id: &str) -> Value {
        let items: Vec<Value> = self
            .carts
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|line| {
                // A product deleted after it was carted comes back unpopulated.
                let product = self
                    .product(&line.product_id)
                    .map_or_else(|| json!(line.product_id), MockProduct::to_json);
                json!({ "_id": line.id, "productId": product, "qty": line.qty })
            })
            .collect();
        json!({ "cartItems": items })
    }
}

/// Shared handle on the mock's data, used by handlers and by tests.
#[derive(Debug, Clone, Default)]
pub struct MockState {
    inner: Arc<Mutex<Store>>,
}

impl MockState {
    fn store(&self) -> MutexGuard<'_, Store> {
        self.inner.lock().expect("mock store poisoned")
    }

    /// Add a product and return its ID.
    pub fn add_product(&self, name: &str, category: &str, price: f64) -> String {
        let mut store = self.store();
        let id = store.next_id("prod");
        store.products.push(MockProduct {
            id: id.clone(),
            name: name.to_string(),
            category: category.to_string(),
            price,
            description: format!("Fresh {}", name.to_lowercase()),
            image: format!("/uploads/{id}.jpg"),
        });
        id
    }

    /// Remove a product directly, bypassing auth.
    pub fn remove_product(&self, id: &str) {
        self.store().products.retain(|p| p.id != id);
    }

    /// Number of products held.
    pub fn product_count(&self) -> usize {
        self.store().products.len()
    }

    /// Register a user directly.
    pub fn add_user(&self, name: &str, email: &str, password: &str) {
        let mut store = self.store();
        let id = store.next_id("user");
        store.users.push(MockUser {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        });
    }

    /// Whether an account exists for `email`.
    pub fn has_user(&self, email: &str) -> bool {
        self.store().users.iter().any(|u| u.email == email)
    }

    /// Invalidate every issued token, as if sessions expired server-side.
    pub fn revoke_tokens(&self) {
        self.store().tokens.clear();
    }

    /// Quantity of `product_id` in the cart of the user with `email`.
    pub fn cart_quantity(&self, email: &str, product_id: &str) -> i64 {
        let store = self.store();
        let Some(user) = store.users.iter().find(|u| u.email == email) else {
            return 0;
        };
        store
            .carts
            .get(&user.id)
            .into_iter()
            .flatten()
            .filter(|line| line.product_id == product_id)
            .map(|line| line.qty)
            .sum()
    }

    /// Fail the next `method path` request (e.g. `"GET /api/cart"`) with
    /// `status`, and `{ "message": message }` when a message is given.
    pub fn fail_next(&self, route: &str, status: StatusCode, message: Option<&str>) {
        self.store()
            .failures
            .insert(route.to_string(), (status, message.map(str::to_string)));
    }

    /// Every request seen, as `"METHOD /path"`, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.store().requests.clone()
    }

    /// Requests seen since the log was last cleared.
    pub fn clear_requests(&self) {
        self.store().requests.clear();
    }
}

// =============================================================================
// Server
// =============================================================================

/// A running mock service on an ephemeral local port.
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    state: MockState,
}

impl MockServer {
    /// Bind to `127.0.0.1:0` and serve in the background.
    pub async fn start() -> Self {
        let state = MockState::default();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");

        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock server stopped");
        });

        Self { addr, state }
    }

    /// The data behind the server.
    pub const fn state(&self) -> &MockState {
        &self.state
    }

    /// The server root, without the `/api` suffix.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing here, with the session file in `dir`.
    pub fn config(&self, dir: &Path) -> PantryConfig {
        PantryConfig::for_base_url(&self.base_url(), dir.join("session.json"))
            .expect("mock server URL is valid")
    }

    /// A fresh client session against this server.
    pub async fn app(&self, dir: &Path) -> AppState {
        AppState::new(self.config(dir))
            .await
            .expect("build app state")
    }

    /// A client session already logged in as a new shopper.
    pub async fn shopper(&self, dir: &Path, email: &str) -> AppState {
        self.state.add_user("Shopper", email, "secret123");
        let app = self.app(dir).await;
        app.login(email, "secret123").await.expect("shopper login");
        app
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/user/register", axum::routing::post(register))
        .route("/api/user/login", axum::routing::post(login))
        .route("/api/product", get(list_products).post(create_product))
        .route(
            "/api/product/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route(
            "/api/cart",
            get(get_cart).post(add_to_cart).delete(clear_cart),
        )
        .route("/api/cart/{id}", put(update_line).delete(delete_line))
        .layer(middleware::from_fn_with_state(state.clone(), record_and_fail))
        .with_state(state)
}

/// Log the request and serve any injected failure for its route.
async fn record_and_fail(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let route = format!("{} {}", request.method(), request.uri().path());
    let failure = {
        let mut store = state.store();
        store.requests.push(route.clone());
        store.failures.remove(&route)
    };

    match failure {
        Some((status, Some(message))) => (status, Json(json!({ "message": message }))).into_response(),
        Some((status, None)) => (status, "upstream unavailable").into_response(),
        None => next.run(request).await,
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn unauthorized() -> Response {
    message(StatusCode::UNAUTHORIZED, "Not authorized, token failed")
}

/// The user ID behind the bearer token, if valid.
fn authenticate(state: &MockState, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    state.store().tokens.get(token).cloned()
}

// =============================================================================
// User handlers
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    confirm_password: String,
}

async fn register(State(state): State<MockState>, Json(body): Json<RegisterBody>) -> Response {
    if body.password != body.confirm_password {
        return message(StatusCode::BAD_REQUEST, "Passwords do not match");
    }
    if state.has_user(&body.email) {
        return message(StatusCode::BAD_REQUEST, "User already exists");
    }
    state.add_user(&body.name, &body.email, &body.password);
    message(StatusCode::CREATED, "User registered successfully")
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> Response {
    let mut store = state.store();
    let Some(user) = store
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .cloned()
    else {
        return message(StatusCode::BAD_REQUEST, "Invalid email or password");
    };

    let token = store.next_id("token");
    store.tokens.insert(token.clone(), user.id.clone());
    Json(json!({
        "message": "Login successful",
        "token": token,
        "user": { "_id": user.id, "name": user.name, "email": user.email },
    }))
    .into_response()
}

// =============================================================================
// Product handlers
// =============================================================================

async fn list_products(State(state): State<MockState>) -> Response {
    let store = state.store();
    let products: Vec<Value> = store.products.iter().map(MockProduct::to_json).collect();
    Json(products).into_response()
}

async fn get_product(State(state): State<MockState>, UrlPath(id): UrlPath<String>) -> Response {
    state.store().product(&id).map_or_else(
        || message(StatusCode::NOT_FOUND, "Product not found"),
        |p| Json(p.to_json()).into_response(),
    )
}

/// Fields read from a product multipart form.
#[derive(Default)]
struct ProductFields {
    name: Option<String>,
    category: Option<String>,
    price: Option<f64>,
    description: Option<String>,
    image: Option<String>,
}

async fn read_product_form(mut multipart: Multipart) -> Result<ProductFields, Response> {
    let mut fields = ProductFields::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| message(StatusCode::BAD_REQUEST, "Malformed form"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| message(StatusCode::BAD_REQUEST, "Malformed image"))?;
            if bytes.is_empty() {
                return Err(message(StatusCode::BAD_REQUEST, "Empty image"));
            }
            fields.image = Some(format!("/uploads/{file_name}"));
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|_| message(StatusCode::BAD_REQUEST, "Malformed form"))?;
        match name.as_str() {
            "name" => fields.name = Some(text),
            "category" => fields.category = Some(text),
            "price" => {
                fields.price = Some(
                    text.parse()
                        .map_err(|_| message(StatusCode::BAD_REQUEST, "Invalid price"))?,
                );
            }
            "description" => fields.description = Some(text),
            _ => {}
        }
    }
    Ok(fields)
}

async fn create_product(
    State(state): State<MockState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if authenticate(&state, &headers).is_none() {
        return unauthorized();
    }
    let fields = match read_product_form(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };
    let (Some(name), Some(category), Some(price), Some(description)) =
        (fields.name, fields.category, fields.price, fields.description)
    else {
        return message(StatusCode::BAD_REQUEST, "All fields are required");
    };

    let mut store = state.store();
    let id = store.next_id("prod");
    let product = MockProduct {
        image: fields.image.unwrap_or_default(),
        id,
        name,
        category,
        price,
        description,
    };
    let body = product.to_json();
    store.products.push(product);
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_product(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    multipart: Multipart,
) -> Response {
    if authenticate(&state, &headers).is_none() {
        return unauthorized();
    }
    let fields = match read_product_form(multipart).await {
        Ok(fields) => fields,
        Err(response) => return response,
    };

    let mut store = state.store();
    let Some(product) = store.products.iter_mut().find(|p| p.id == id) else {
        return message(StatusCode::NOT_FOUND, "Product not found");
    };
    if let Some(name) = fields.name {
        product.name = name;
    }
    if let Some(category) = fields.category {
        product.category = category;
    }
    if let Some(price) = fields.price {
        product.price = price;
    }
    if let Some(description) = fields.description {
        product.description = description;
    }
    if let Some(image) = fields.image {
        product.image = image;
    }
    Json(product.to_json()).into_response()
}

async fn delete_product(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    if authenticate(&state, &headers).is_none() {
        return unauthorized();
    }
    let mut store = state.store();
    let before = store.products.len();
    store.products.retain(|p| p.id != id);
    if store.products.len() == before {
        return message(StatusCode::NOT_FOUND, "Product not found");
    }
    message(StatusCode::OK, "Product removed")
}

// =============================================================================
// Cart handlers
// =============================================================================

async fn get_cart(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized();
    };
    Json(state.store().cart_json(&user_id)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBody {
    product_id: String,
    qty: i64,
}

async fn add_to_cart(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<AddBody>,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized();
    };
    if body.qty < 1 {
        return message(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let mut store = state.store();
    if store.product(&body.product_id).is_none() {
        return message(StatusCode::NOT_FOUND, "Product not found");
    }
    let line_id = store.next_id("line");
    let lines = store.carts.entry(user_id.clone()).or_default();
    if let Some(line) = lines.iter_mut().find(|l| l.product_id == body.product_id) {
        line.qty += body.qty;
    } else {
        lines.push(MockLine {
            id: line_id,
            product_id: body.product_id,
            qty: body.qty,
        });
    }
    (StatusCode::CREATED, Json(store.cart_json(&user_id))).into_response()
}

#[derive(Deserialize)]
struct UpdateBody {
    qty: i64,
}

async fn update_line(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
    Json(body): Json<UpdateBody>,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized();
    };
    if body.qty < 1 {
        return message(StatusCode::BAD_REQUEST, "Quantity must be at least 1");
    }

    let mut store = state.store();
    let Some(line) = store
        .carts
        .get_mut(&user_id)
        .and_then(|lines| lines.iter_mut().find(|l| l.id == id))
    else {
        return message(StatusCode::NOT_FOUND, "Cart item not found");
    };
    line.qty = body.qty;
    Json(store.cart_json(&user_id)).into_response()
}

async fn delete_line(
    State(state): State<MockState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> Response {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized();
    };
    let mut store = state.store();
    let lines = store.carts.entry(user_id).or_default();
    let before = lines.len();
    lines.retain(|l| l.id != id);
    if lines.len() == before {
        return message(StatusCode::NOT_FOUND, "Cart item not found");
    }
    message(StatusCode::OK, "Item removed from cart")
}

async fn clear_cart(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let Some(user_id) = authenticate(&state, &headers) else {
        return unauthorized();
    };
    state.store().carts.remove(&user_id);
    message(StatusCode::OK, "Cart cleared")
}
