//! Field reordering over an ordered id list. The grab/hover/drop surface
//! matches a pointer drag, but the field panel drives it from the keyboard
//! just as well.

use crate::columns::FieldId;

#[derive(Debug, Default)]
pub struct ReorderController {
    order: Vec<FieldId>,
    grabbed: Option<usize>,
    filter_active: bool,
}

impl ReorderController {
    pub fn new(order: Vec<FieldId>) -> Self {
        Self {
            order,
            grabbed: None,
            filter_active: false,
        }
    }

    pub fn order(&self) -> &[FieldId] {
        &self.order
    }

    pub fn grabbed(&self) -> Option<usize> {
        self.grabbed
    }

    /// Replace the canonical order (store changed underneath). Cancels any
    /// grab in progress.
    pub fn set_order(&mut self, order: Vec<FieldId>) {
        self.order = order;
        self.grabbed = None;
    }

    /// While a text filter is active the displayed subset does not
    /// represent the canonical order, so reordering it would corrupt the
    /// underlying order. Grabs are refused until the filter clears.
    pub fn set_filter_active(&mut self, active: bool) {
        self.filter_active = active;
        if active {
            self.grabbed = None;
        }
    }

    pub fn filter_active(&self) -> bool {
        self.filter_active
    }

    /// Pick up the item at `index`. Returns false (and does nothing) when a
    /// filter is active or the index is out of range.
    pub fn grab(&mut self, index: usize) -> bool {
        if self.filter_active || index >= self.order.len() {
            return false;
        }
        self.grabbed = Some(index);
        true
    }

    /// Drag the grabbed item over `index`: the list re-shuffles so the
    /// preview always shows the order a drop would produce.
    pub fn hover(&mut self, index: usize) {
        let Some(from) = self.grabbed else { return };
        if index >= self.order.len() || index == from {
            return;
        }
        let item = self.order.remove(from);
        self.order.insert(index, item);
        self.grabbed = Some(index);
    }

    /// Release: returns the full reordered id list for the store's reorder
    /// action, or None when nothing was grabbed.
    pub fn drop_grabbed(&mut self) -> Option<Vec<FieldId>> {
        self.grabbed.take()?;
        Some(self.order.clone())
    }

    /// Abandon the drag, keeping whatever order the hovers produced out of
    /// the store (caller re-syncs from the store's canonical order).
    pub fn cancel(&mut self) {
        self.grabbed = None;
    }
}
