//! Buffered quantity editing on top of a [`CartStore`].
//!
//! A [`CartEditor`] belongs to one cart view. Quantity changes are held in
//! a [`PendingEdits`] overlay until committed; a change below one skips the
//! overlay and removes the line straight away.

use pantry_core::{CartLine, EditAction, LineId, PendingEdits, Quantity};
use tracing::{debug, instrument};

use super::{CartGateway, CartStore, SyncOutcome};

/// What happened to a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditResult {
    /// Held locally; nothing sent.
    Buffered,
    /// The change asked for removal, which was sent at once.
    Removed(SyncOutcome),
    /// No such line in the cart.
    UnknownLine,
}

/// A cart view's pending quantity edits.
#[derive(Debug)]
pub struct CartEditor<'a, G> {
    store: &'a CartStore<G>,
    pending: PendingEdits,
}

impl<'a, G: CartGateway> CartEditor<'a, G> {
    /// An editor with no pending edits over `store`.
    #[must_use]
    pub fn new(store: &'a CartStore<G>) -> Self {
        Self {
            store,
            pending: PendingEdits::new(),
        }
    }

    /// The overlay, for rendering.
    #[must_use]
    pub const fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    /// Quantity to display for `line`.
    #[must_use]
    pub fn displayed(&self, line: &CartLine) -> Quantity {
        self.pending.displayed(line)
    }

    /// Type a quantity into a line's control.
    pub async fn change(&mut self, line_id: &LineId, requested: i64) -> EditResult {
        self.edit(line_id, |pending, line| pending.set(line, requested))
            .await
    }

    /// Press "+" on a line.
    pub async fn increment(&mut self, line_id: &LineId) -> EditResult {
        self.edit(line_id, PendingEdits::increment).await
    }

    /// Press "-" on a line. At one this removes the line.
    pub async fn decrement(&mut self, line_id: &LineId) -> EditResult {
        self.edit(line_id, PendingEdits::decrement).await
    }

    /// Send a line's pending quantity.
    ///
    /// Returns `None` when the line is clean (or gone) and nothing was sent.
    /// The pending entry is dropped once the update resolves, whatever the
    /// outcome.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn commit(&mut self, line_id: &LineId) -> Option<SyncOutcome> {
        let Some(line) = self.store.line(line_id) else {
            self.pending.resolve(line_id);
            return None;
        };
        let Some(commit) = self.pending.prepare_commit(&line) else {
            debug!("Line is clean, nothing to commit");
            return None;
        };

        let outcome = self
            .store
            .set_quantity(&commit.line_id, i64::from(commit.quantity))
            .await;
        self.pending.resolve(&commit.line_id);
        self.reconcile();
        Some(outcome)
    }

    /// Commit every dirty line in cart order.
    #[instrument(skip(self))]
    pub async fn commit_all(&mut self) -> Vec<(LineId, SyncOutcome)> {
        let lines = self.store.snapshot().lines;
        let commits: Vec<_> = self
            .pending
            .dirty_lines(&lines)
            .filter_map(|line| self.pending.prepare_commit(line))
            .collect();

        let mut results = Vec::with_capacity(commits.len());
        for commit in commits {
            let outcome = self
                .store
                .set_quantity(&commit.line_id, i64::from(commit.quantity))
                .await;
            self.pending.resolve(&commit.line_id);
            results.push((commit.line_id, outcome));
        }
        self.reconcile();
        results
    }

    /// Drop edits for lines that vanished or now match the server.
    pub fn reconcile(&mut self) {
        let state = self.store.snapshot();
        self.pending.reconcile(&state.lines);
    }

    async fn edit(
        &mut self,
        line_id: &LineId,
        action: impl FnOnce(&mut PendingEdits, &CartLine) -> EditAction,
    ) -> EditResult {
        let Some(line) = self.store.line(line_id) else {
            return EditResult::UnknownLine;
        };
        match action(&mut self.pending, &line) {
            EditAction::Buffered => EditResult::Buffered,
            EditAction::Remove(line_id) => {
                let outcome = self.store.remove_line(&line_id).await;
                self.reconcile();
                EditResult::Removed(outcome)
            }
        }
    }
}
