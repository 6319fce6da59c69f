//! Uncommitted quantity edits layered over the cart.
//!
//! A shopper can scrub a quantity control several times before anything is
//! sent to the remote service. Each line is either clean (shows its stored
//! quantity) or dirty (shows the pending value and offers a commit). An
//! entry exists in [`PendingEdits`] only while its line is dirty.
//!
//! Dropping a quantity below one never becomes a pending edit: the caller
//! gets [`EditAction::Remove`] and is expected to remove the line at once.

use std::collections::HashMap;

use crate::cart::CartLine;
use crate::types::{LineId, Quantity};

/// What the caller must do after a quantity control changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// The value was buffered (or the line went back to clean). No request.
    Buffered,
    /// The requested value was below one: remove this line immediately.
    Remove(LineId),
}

/// A dirty line ready to be sent as a quantity update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    /// Line to update.
    pub line_id: LineId,
    /// Quantity to send.
    pub quantity: Quantity,
}

/// Per-line pending quantities, scoped to one cart view.
#[derive(Debug, Clone, Default)]
pub struct PendingEdits {
    entries: HashMap<LineId, Quantity>,
}

impl PendingEdits {
    /// No pending edits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity to show for `line`: the pending value if dirty, else stored.
    #[must_use]
    pub fn displayed(&self, line: &CartLine) -> Quantity {
        self.entries
            .get(&line.line_id)
            .copied()
            .unwrap_or(line.quantity)
    }

    /// Whether `line` has a pending value that differs from its stored one.
    #[must_use]
    pub fn is_dirty(&self, line: &CartLine) -> bool {
        self.entries
            .get(&line.line_id)
            .is_some_and(|pending| *pending != line.quantity)
    }

    /// Record a typed quantity for `line`.
    pub fn set(&mut self, line: &CartLine, requested: i64) -> EditAction {
        let Some(quantity) = Quantity::new(requested) else {
            self.entries.remove(&line.line_id);
            return EditAction::Remove(line.line_id.clone());
        };

        if quantity == line.quantity {
            self.entries.remove(&line.line_id);
        } else {
            self.entries.insert(line.line_id.clone(), quantity);
        }
        EditAction::Buffered
    }

    /// Step the displayed quantity up by one.
    pub fn increment(&mut self, line: &CartLine) -> EditAction {
        let next = i64::from(self.displayed(line)).saturating_add(1);
        self.set(line, next)
    }

    /// Step the displayed quantity down by one; at one this asks for removal.
    pub fn decrement(&mut self, line: &CartLine) -> EditAction {
        let next = i64::from(self.displayed(line)) - 1;
        self.set(line, next)
    }

    /// The update to send for `line`, or `None` if it is clean.
    ///
    /// The entry stays in place until [`PendingEdits::resolve`] is called
    /// once the update finished, so the view keeps showing the pending value
    /// while the request is in flight.
    #[must_use]
    pub fn prepare_commit(&self, line: &CartLine) -> Option<PendingCommit> {
        self.is_dirty(line).then(|| PendingCommit {
            line_id: line.line_id.clone(),
            quantity: self.displayed(line),
        })
    }

    /// Drop the entry for a line whose commit finished (either way).
    pub fn resolve(&mut self, line_id: &LineId) {
        self.entries.remove(line_id);
    }

    /// Drop entries whose line is gone or whose value now matches the
    /// stored quantity. Call after every refetch.
    pub fn reconcile(&mut self, lines: &[CartLine]) {
        self.entries.retain(|line_id, pending| {
            lines
                .iter()
                .find(|line| &line.line_id == line_id)
                .is_some_and(|line| line.quantity != *pending)
        });
    }

    /// Dirty lines in cart order.
    pub fn dirty_lines<'a>(&'a self, lines: &'a [CartLine]) -> impl Iterator<Item = &'a CartLine> {
        lines.iter().filter(|line| self.is_dirty(line))
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
