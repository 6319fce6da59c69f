//! The cart store: the single writer of [`CartState`].
//!
//! Every mutation goes to the gateway first; the local copy is only ever
//! replaced by a fresh fetch after the gateway confirmed the change. The one
//! exception is `clear`, whose result (no lines) is known without asking.
//!
//! Failures never escape as `Err`: each operation records a human-readable
//! message in `last_error` and returns a [`SyncOutcome`] saying what
//! happened, so a front end can show the message and offer a retry.

use std::sync::atomic::{AtomicUsize, Ordering};

use pantry_core::{CartLine, CartState, LineId, ProductId, Quantity};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::CartGateway;
use crate::error::{ApiError, ErrorKind, add_breadcrumb};
use crate::session::AuthToken;

/// How a cart operation ended.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The change was confirmed and the local cart reflects it.
    Applied,
    /// The change was confirmed but the follow-up fetch failed: the local
    /// cart is stale and `last_error` holds the fetch failure.
    AppliedStale,
    /// Nothing changed remotely. `last_error` holds the reason.
    Failed(ErrorKind),
}

impl SyncOutcome {
    /// Whether the remote cart accepted the change.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied | Self::AppliedStale)
    }

    /// Whether the front end should send the shopper to log in.
    #[must_use]
    pub const fn needs_login(self) -> bool {
        matches!(self, Self::Failed(ErrorKind::AuthRequired))
    }
}

/// A gateway mutation, borrowed from the caller for the duration of a call.
#[derive(Debug, Clone, Copy)]
enum Mutation<'a> {
    Add(&'a ProductId, Quantity),
    Update(&'a LineId, Quantity),
    Delete(&'a LineId),
    Clear,
}

impl Mutation<'_> {
    const fn label(self) -> &'static str {
        match self {
            Self::Add(..) => "add",
            Self::Update(..) => "update",
            Self::Delete(_) => "remove",
            Self::Clear => "clear",
        }
    }
}

/// Owns the shopper's [`CartState`] and mediates every change to it.
///
/// Methods take `&self`; overlapping calls are allowed and are not
/// serialized, so when two mutations race the final lines are whichever
/// fetch resolved last.
pub struct CartStore<G> {
    gateway: G,
    token: watch::Sender<Option<AuthToken>>,
    state: watch::Sender<CartState>,
    in_flight: AtomicUsize,
}

impl<G> std::fmt::Debug for CartStore<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &*self.state.borrow())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl<G: CartGateway> CartStore<G> {
    /// A store with an empty cart. Call [`CartStore::fetch`] to populate it.
    #[must_use]
    pub fn new(gateway: G, token: Option<AuthToken>) -> Self {
        Self {
            gateway,
            token: watch::Sender::new(token),
            state: watch::Sender::new(CartState::empty()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// The gateway this store talks to.
    #[must_use]
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Swap the bearer token. Dropping it (logout) discards the local cart.
    pub fn set_token(&self, token: Option<AuthToken>) {
        let signed_out = token.is_none();
        self.token.send_replace(token);
        if signed_out {
            self.state.send_modify(|state| {
                state.replace_lines(Vec::new());
                state.last_error = None;
            });
        }
    }

    /// Whether a token is set.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.borrow().is_some()
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Watch the state; the receiver sees every replacement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Quantity of `product_id` in the cart, or 0.
    #[must_use]
    pub fn item_quantity(&self, product_id: &ProductId) -> u32 {
        self.state.borrow().item_quantity(product_id)
    }

    /// A copy of one line, if present.
    #[must_use]
    pub fn line(&self, line_id: &LineId) -> Option<CartLine> {
        self.state.borrow().line(line_id).cloned()
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the full cart, replacing the local lines.
    ///
    /// On failure the previous lines are kept.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> SyncOutcome {
        let Some(token) = self.current_token() else {
            return self.reject("fetch", &ApiError::login_required());
        };

        self.begin();
        let outcome = match self.refetch(&token).await {
            Ok(()) => SyncOutcome::Applied,
            Err(e) => self.record_failure("fetch", &e),
        };
        self.finish();
        outcome
    }

    /// Add `quantity` units of a product, then refetch.
    ///
    /// A quantity below one is rejected without contacting the service.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_line(&self, product_id: &ProductId, quantity: i64) -> SyncOutcome {
        let Some(quantity) = Quantity::new(quantity) else {
            return self.reject(
                "add",
                &ApiError::Validation("Quantity must be at least 1".to_string()),
            );
        };
        self.apply(Mutation::Add(product_id, quantity)).await
    }

    /// Remove a line, then refetch.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_line(&self, line_id: &LineId) -> SyncOutcome {
        self.apply(Mutation::Delete(line_id)).await
    }

    /// Set a line's quantity, then refetch. Below one removes the line.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn set_quantity(&self, line_id: &LineId, quantity: i64) -> SyncOutcome {
        match Quantity::new(quantity) {
            Some(quantity) => self.apply(Mutation::Update(line_id, quantity)).await,
            None => self.remove_line(line_id).await,
        }
    }

    /// Empty the cart. No refetch: the result is known.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> SyncOutcome {
        self.apply(Mutation::Clear).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn current_token(&self) -> Option<AuthToken> {
        self.token.borrow().clone()
    }

    async fn apply(&self, mutation: Mutation<'_>) -> SyncOutcome {
        let Some(token) = self.current_token() else {
            return self.reject(mutation.label(), &ApiError::login_required());
        };

        self.begin();
        let outcome = match self.dispatch(&token, mutation).await {
            Err(e) => self.record_failure(mutation.label(), &e),
            Ok(()) if matches!(mutation, Mutation::Clear) => {
                self.state.send_modify(|state| state.replace_lines(Vec::new()));
                info!("Cart cleared");
                SyncOutcome::Applied
            }
            Ok(()) => match self.refetch(&token).await {
                Ok(()) => SyncOutcome::Applied,
                Err(e) => {
                    // The mutation stands; only the local copy is behind.
                    let _ = self.record_failure("refetch", &e);
                    SyncOutcome::AppliedStale
                }
            },
        };
        self.finish();
        outcome
    }

    async fn dispatch(&self, token: &AuthToken, mutation: Mutation<'_>) -> Result<(), ApiError> {
        match mutation {
            Mutation::Add(product_id, quantity) => {
                self.gateway.add_item(token, product_id, quantity).await
            }
            Mutation::Update(line_id, quantity) => {
                self.gateway.update_item(token, line_id, quantity).await
            }
            Mutation::Delete(line_id) => self.gateway.delete_item(token, line_id).await,
            Mutation::Clear => self.gateway.clear_cart(token).await,
        }
    }

    async fn refetch(&self, token: &AuthToken) -> Result<(), ApiError> {
        let lines = self.gateway.fetch_cart(token).await?;
        debug!(lines = lines.len(), "Replacing cart lines");
        self.state.send_modify(|state| state.replace_lines(lines));
        Ok(())
    }

    /// Mark a round-trip as started and clear the previous error.
    ///
    /// The counter only changes under the state's write lock, so the flag
    /// always matches it.
    fn begin(&self) {
        self.state.send_modify(|state| {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            state.is_syncing = true;
            state.last_error = None;
        });
    }

    /// Mark a round-trip as finished; syncing stays on while others run.
    fn finish(&self) {
        self.state.send_modify(|state| {
            let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
            state.is_syncing = remaining > 0;
        });
    }

    /// Fail an operation before any request was sent.
    fn reject(&self, operation: &'static str, error: &ApiError) -> SyncOutcome {
        debug!(operation, error = %error, "Cart operation rejected locally");
        self.state
            .send_modify(|state| state.last_error = Some(error.to_string()));
        SyncOutcome::Failed(error.kind())
    }

    fn record_failure(&self, operation: &'static str, error: &ApiError) -> SyncOutcome {
        let message = error.to_string();
        warn!(operation, error = %message, "Cart operation failed");
        add_breadcrumb(
            "cart",
            &format!("Cart {operation} failed"),
            Some(&[("error", message.as_str())]),
        );
        self.state.send_modify(|state| state.last_error = Some(message));
        SyncOutcome::Failed(error.kind())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use pantry_core::Price;
    use tokio::sync::Notify;

    use super::super::fake::{FakeGateway, Failure, token};
    use super::*;

    fn store_with(gateway: FakeGateway) -> CartStore<FakeGateway> {
        CartStore::new(gateway, Some(token()))
    }

    #[tokio::test]
    async fn test_fetch_populates_lines() {
        let gateway = FakeGateway::new().with_line("l1", "apples", 499, 2);
        let store = store_with(gateway);

        assert_eq!(store.fetch().await, SyncOutcome::Applied);
        let state = store.snapshot();
        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.total(), Price::from_minor(998));
        assert!(!state.is_syncing);
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_fetch_network_failure_keeps_lines() {
        let gateway = FakeGateway::new().with_line("l1", "apples", 499, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        store.gateway().fail("fetch", Failure::Network);
        let outcome = store.fetch().await;

        assert_eq!(outcome, SyncOutcome::Failed(ErrorKind::NetworkFailure));
        let state = store.snapshot();
        assert_eq!(state.lines.len(), 1);
        assert!(state.last_error.is_some());
        assert!(!state.is_syncing);
    }

    #[tokio::test]
    async fn test_add_to_empty_cart() {
        let gateway = FakeGateway::new().with_product("p1", "Milk", 300);
        let store = store_with(gateway);

        let outcome = store.add_line(&ProductId::new("p1"), 1).await;

        assert_eq!(outcome, SyncOutcome::Applied);
        let state = store.snapshot();
        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.lines[0].quantity.get(), 1);
        assert_eq!(store.item_quantity(&ProductId::new("p1")), 1);
    }

    #[tokio::test]
    async fn test_add_existing_product_merges() {
        let gateway = FakeGateway::new().with_line("l1", "p1", 300, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        let _ = store.add_line(&ProductId::new("p1"), 3).await;

        let state = store.snapshot();
        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.lines[0].quantity.get(), 5);
    }

    #[tokio::test]
    async fn test_add_zero_is_validation_failure_without_call() {
        let gateway = FakeGateway::new().with_product("p1", "Milk", 300);
        let store = store_with(gateway);

        let outcome = store.add_line(&ProductId::new("p1"), 0).await;

        assert_eq!(outcome, SyncOutcome::Failed(ErrorKind::ValidationFailure));
        assert!(store.gateway().calls().is_empty());
        assert!(store.snapshot().last_error.is_some());
    }

    #[tokio::test]
    async fn test_set_quantity_replaces_from_server() {
        let gateway = FakeGateway::new().with_line("a", "p1", 499, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        let outcome = store.set_quantity(&LineId::new("a"), 5).await;

        assert_eq!(outcome, SyncOutcome::Applied);
        let state = store.snapshot();
        assert_eq!(state.lines.len(), 1);
        assert_eq!(state.lines[0].quantity.get(), 5);
        assert_eq!(state.total(), Price::from_minor(2495));
        assert_eq!(state.total().to_string(), "₹24.95");
    }

    #[tokio::test]
    async fn test_set_quantity_below_one_removes() {
        let gateway = FakeGateway::new()
            .with_line("a", "p1", 499, 2)
            .with_line("b", "p2", 100, 1);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        let outcome = store.set_quantity(&LineId::new("a"), 0).await;

        assert_eq!(outcome, SyncOutcome::Applied);
        assert_eq!(
            store.gateway().calls(),
            vec!["fetch", "delete a", "fetch"]
        );
        assert!(store.line(&LineId::new("a")).is_none());
        assert_eq!(store.snapshot().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_line() {
        let gateway = FakeGateway::new().with_line("a", "p1", 499, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        assert_eq!(store.remove_line(&LineId::new("a")).await, SyncOutcome::Applied);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_clear_does_not_refetch() {
        let gateway = FakeGateway::new()
            .with_line("a", "p1", 499, 2)
            .with_line("b", "p2", 100, 1);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        assert_eq!(store.clear().await, SyncOutcome::Applied);
        let state = store.snapshot();
        assert!(state.lines.is_empty());
        assert_eq!(state.total(), Price::ZERO);
        assert_eq!(store.gateway().calls(), vec!["fetch", "clear"]);
    }

    #[tokio::test]
    async fn test_rejected_mutation_keeps_lines_and_message() {
        let gateway = FakeGateway::new().with_line("a", "p1", 499, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        store
            .gateway()
            .fail("update", Failure::Rejected("Product out of stock"));
        let outcome = store.set_quantity(&LineId::new("a"), 9).await;

        assert_eq!(outcome, SyncOutcome::Failed(ErrorKind::ServerRejection));
        let state = store.snapshot();
        assert_eq!(state.last_error.as_deref(), Some("Product out of stock"));
        assert_eq!(state.lines[0].quantity.get(), 2);
    }

    #[tokio::test]
    async fn test_failed_refetch_is_applied_stale() {
        let gateway = FakeGateway::new().with_line("a", "p1", 499, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        store.gateway().fail("fetch", Failure::Network);
        let outcome = store.set_quantity(&LineId::new("a"), 4).await;

        assert_eq!(outcome, SyncOutcome::AppliedStale);
        assert!(outcome.is_applied());
        let state = store.snapshot();
        assert!(state.last_error.is_some());
        assert_eq!(state.lines[0].quantity.get(), 2);

        // Retrying the fetch catches up.
        store.gateway().heal("fetch");
        assert_eq!(store.fetch().await, SyncOutcome::Applied);
        assert_eq!(store.snapshot().lines[0].quantity.get(), 4);
        assert!(store.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn test_missing_token_needs_login_without_call() {
        let store = CartStore::new(FakeGateway::new(), None);

        let outcome = store.fetch().await;

        assert!(outcome.needs_login());
        assert!(store.gateway().calls().is_empty());
    }

    #[tokio::test]
    async fn test_server_unauthorized_needs_login() {
        let store = store_with(FakeGateway::new());
        store.gateway().fail("fetch", Failure::Unauthorized);

        assert!(store.fetch().await.needs_login());
    }

    #[tokio::test]
    async fn test_logout_discards_cart() {
        let gateway = FakeGateway::new().with_line("a", "p1", 499, 2);
        let store = store_with(gateway);
        let _ = store.fetch().await;

        store.set_token(None);

        assert!(store.snapshot().is_empty());
        assert!(!store.has_token());
    }

    #[tokio::test]
    async fn test_total_tracks_successful_sequence() {
        let gateway = FakeGateway::new()
            .with_product("p1", "Apples", 499)
            .with_product("p2", "Bread", 125)
            .with_product("p3", "Eggs", 349);
        let store = store_with(gateway);

        let _ = store.add_line(&ProductId::new("p1"), 2).await;
        let _ = store.add_line(&ProductId::new("p2"), 1).await;
        let _ = store.add_line(&ProductId::new("p3"), 4).await;
        let p2_line = store.snapshot().lines[1].line_id.clone();
        let _ = store.set_quantity(&p2_line, 3).await;
        let p1_line = store.snapshot().lines[0].line_id.clone();
        let _ = store.remove_line(&p1_line).await;

        let state = store.snapshot();
        let expected: Price = state
            .lines
            .iter()
            .map(|l| l.unit_price.times(l.quantity))
            .sum();
        assert_eq!(state.total(), expected);
        assert_eq!(state.total(), Price::from_minor(125 * 3 + 349 * 4));
    }

    #[tokio::test]
    async fn test_subscribers_see_replacements() {
        let gateway = FakeGateway::new().with_line("a", "p1", 499, 2);
        let store = store_with(gateway);
        let mut rx = store.subscribe();

        let _ = store.fetch().await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().lines.len(), 1);
    }

    /// Holds each `fetch_cart` until its gate is opened, in call order.
    struct GatedGateway {
        gates: std::sync::Mutex<std::collections::VecDeque<Arc<Notify>>>,
        entered: watch::Sender<usize>,
    }

    impl GatedGateway {
        fn new(gates: impl IntoIterator<Item = Arc<Notify>>) -> Self {
            Self {
                gates: std::sync::Mutex::new(gates.into_iter().collect()),
                entered: watch::Sender::new(0),
            }
        }
    }

    impl CartGateway for GatedGateway {
        async fn fetch_cart(&self, _token: &AuthToken) -> Result<Vec<CartLine>, ApiError> {
            let gate = self.gates.lock().unwrap().pop_front();
            self.entered.send_modify(|n| *n += 1);
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(Vec::new())
        }

        async fn add_item(&self, _: &AuthToken, _: &ProductId, _: Quantity) -> Result<(), ApiError> {
            Ok(())
        }

        async fn update_item(&self, _: &AuthToken, _: &LineId, _: Quantity) -> Result<(), ApiError> {
            Ok(())
        }

        async fn delete_item(&self, _: &AuthToken, _: &LineId) -> Result<(), ApiError> {
            Ok(())
        }

        async fn clear_cart(&self, _: &AuthToken) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_syncing_while_any_call_is_outstanding() {
        let first_gate = Arc::new(Notify::new());
        let second_gate = Arc::new(Notify::new());
        let gateway = GatedGateway::new([first_gate.clone(), second_gate.clone()]);
        let store = Arc::new(CartStore::new(gateway, Some(token())));
        let mut entered = store.gateway().entered.subscribe();

        let first = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.fetch().await }
        });
        entered.wait_for(|n| *n == 1).await.unwrap();
        assert!(store.snapshot().is_syncing);

        let second = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.fetch().await }
        });
        entered.wait_for(|n| *n == 2).await.unwrap();

        // The later call finishing first must not clear the flag.
        second_gate.notify_one();
        assert_eq!(second.await.unwrap(), SyncOutcome::Applied);
        assert!(store.snapshot().is_syncing);

        first_gate.notify_one();
        assert_eq!(first.await.unwrap(), SyncOutcome::Applied);
        assert!(!store.snapshot().is_syncing);
    }
}
