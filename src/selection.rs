//! Cell selection and edit-session state machine.
//!
//! Owns the active cell, range selection, and the single edit session.
//! Pointer and keyboard input both drive the same transitions; committing
//! hands a `CommitRequest` back to the caller, which routes it through the
//! table store (the machine itself never writes).

use crate::cells::FieldType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Anchor and focus cells; the selected range is the rectangle they define.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub anchor: CellCoord,
    pub focus: CellCoord,
}

impl SelectionRange {
    pub fn single(coord: CellCoord) -> Self {
        Self {
            anchor: coord,
            focus: coord,
        }
    }

    /// Top-left and bottom-right corners of the rectangle.
    pub fn normalized(&self) -> (CellCoord, CellCoord) {
        (
            CellCoord::new(
                self.anchor.row.min(self.focus.row),
                self.anchor.col.min(self.focus.col),
            ),
            CellCoord::new(
                self.anchor.row.max(self.focus.row),
                self.anchor.col.max(self.focus.col),
            ),
        )
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        let (tl, br) = self.normalized();
        (tl.row..=br.row).contains(&coord.row) && (tl.col..=br.col).contains(&coord.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Inline,
    Expanded,
}

impl EditMode {
    pub fn for_field_type(field_type: FieldType) -> Self {
        if field_type.uses_expanded_editor() {
            Self::Expanded
        } else {
            Self::Inline
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    Idle,
    CellActive(CellCoord),
    RangeSelecting(SelectionRange),
    EditingInline { coord: CellCoord, pending: String },
    EditingExpanded { coord: CellCoord, pending: String },
}

/// A committed edit, to be applied through the store exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub coord: CellCoord,
    pub value: String,
}

#[derive(Debug)]
pub struct SelectionMachine {
    state: SelectionState,
    /// Pointer button held down during a drag-select.
    dragging: bool,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
            dragging: false,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(
            self.state,
            SelectionState::EditingInline { .. } | SelectionState::EditingExpanded { .. }
        )
    }

    /// The at-most-one edit session, as (coord, mode, pending).
    pub fn edit_session(&self) -> Option<(CellCoord, EditMode, &str)> {
        match &self.state {
            SelectionState::EditingInline { coord, pending } => {
                Some((*coord, EditMode::Inline, pending.as_str()))
            }
            SelectionState::EditingExpanded { coord, pending } => {
                Some((*coord, EditMode::Expanded, pending.as_str()))
            }
            _ => None,
        }
    }

    /// The cell keyboard input targets: the focus of a range, the edited
    /// cell, or the active cell.
    pub fn active_cell(&self) -> Option<CellCoord> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::CellActive(coord) => Some(*coord),
            SelectionState::RangeSelecting(range) => Some(range.focus),
            SelectionState::EditingInline { coord, .. }
            | SelectionState::EditingExpanded { coord, .. } => Some(*coord),
        }
    }

    /// Current selection rectangle (single active cell counts).
    pub fn selection(&self) -> Option<SelectionRange> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::CellActive(coord) => Some(SelectionRange::single(*coord)),
            SelectionState::RangeSelecting(range) => Some(*range),
            SelectionState::EditingInline { coord, .. }
            | SelectionState::EditingExpanded { coord, .. } => {
                Some(SelectionRange::single(*coord))
            }
        }
    }

    /// Pointer-down on a cell. Any open edit session commits first (the
    /// blur/click-away rule); shift extends from the current anchor instead
    /// of re-anchoring.
    pub fn pointer_down(&mut self, coord: CellCoord, shift: bool) -> Option<CommitRequest> {
        let commit = self.close_session();
        self.dragging = true;
        if shift {
            if let Some(range) = self.selection() {
                self.state = SelectionState::RangeSelecting(SelectionRange {
                    anchor: range.anchor,
                    focus: coord,
                });
                return commit;
            }
        }
        self.state = SelectionState::CellActive(coord);
        commit
    }

    /// Pointer moved with the button held: grow the range continuously.
    pub fn pointer_drag(&mut self, coord: CellCoord) {
        if !self.dragging {
            return;
        }
        match &self.state {
            SelectionState::CellActive(anchor) if *anchor != coord => {
                self.state = SelectionState::RangeSelecting(SelectionRange {
                    anchor: *anchor,
                    focus: coord,
                });
            }
            SelectionState::RangeSelecting(range) => {
                self.state = SelectionState::RangeSelecting(SelectionRange {
                    anchor: range.anchor,
                    focus: coord,
                });
            }
            _ => {}
        }
    }

    /// Pointer-up freezes the range.
    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Keyboard navigation: move the active cell, clamped to the grid.
    /// Leaves any edit session by committing it first (caller applies the
    /// returned request before moving on).
    pub fn move_active(
        &mut self,
        d_row: isize,
        d_col: isize,
        rows: usize,
        cols: usize,
    ) -> Option<CommitRequest> {
        if rows == 0 || cols == 0 {
            return None;
        }
        let commit = self.close_session();
        let from = self.active_cell().unwrap_or(CellCoord::new(0, 0));
        let coord = step(from, d_row, d_col, rows, cols);
        self.state = SelectionState::CellActive(coord);
        commit
    }

    /// Shift+arrow: extend the range from its anchor.
    pub fn extend_active(&mut self, d_row: isize, d_col: isize, rows: usize, cols: usize) {
        if rows == 0 || cols == 0 || self.is_editing() {
            return;
        }
        let range = match self.selection() {
            Some(range) => range,
            None => return,
        };
        let focus = step(range.focus, d_row, d_col, rows, cols);
        self.state = SelectionState::RangeSelecting(SelectionRange {
            anchor: range.anchor,
            focus,
        });
    }

    /// Open an edit session on the active cell (double-click or Enter). An
    /// already-open session commits implicitly, keeping the at-most-one
    /// invariant.
    pub fn begin_edit(&mut self, mode: EditMode, initial: String) -> Option<CommitRequest> {
        let coord = match self.active_cell() {
            Some(coord) => coord,
            None => return None,
        };
        let commit = self.close_session();
        self.state = match mode {
            EditMode::Inline => SelectionState::EditingInline {
                coord,
                pending: initial,
            },
            EditMode::Expanded => SelectionState::EditingExpanded {
                coord,
                pending: initial,
            },
        };
        commit
    }

    /// Replace the pending value as the user types. No store write happens
    /// here; the pending value only leaves the machine on commit.
    pub fn set_pending(&mut self, value: String) {
        match &mut self.state {
            SelectionState::EditingInline { pending, .. }
            | SelectionState::EditingExpanded { pending, .. } => *pending = value,
            _ => {}
        }
    }

    /// Enter (without shift) or blur: commit the pending value and return
    /// to `CellActive`.
    pub fn commit(&mut self) -> Option<CommitRequest> {
        self.close_session()
    }

    /// Escape: drop the pending value, no write, back to `CellActive`.
    pub fn discard(&mut self) {
        if let Some(coord) = self.edit_session().map(|(c, _, _)| c) {
            self.state = SelectionState::CellActive(coord);
        }
    }

    /// Reset on row-id reset or table navigation.
    pub fn reset(&mut self) {
        self.state = SelectionState::Idle;
        self.dragging = false;
    }

    /// Clamp state after rows/columns shrank (e.g. column deleted).
    pub fn clamp_to(&mut self, rows: usize, cols: usize) {
        if rows == 0 || cols == 0 {
            self.reset();
            return;
        }
        let clamp = |c: CellCoord| CellCoord::new(c.row.min(rows - 1), c.col.min(cols - 1));
        self.state = match self.state.clone() {
            SelectionState::Idle => SelectionState::Idle,
            SelectionState::CellActive(c) => SelectionState::CellActive(clamp(c)),
            SelectionState::RangeSelecting(r) => SelectionState::RangeSelecting(SelectionRange {
                anchor: clamp(r.anchor),
                focus: clamp(r.focus),
            }),
            SelectionState::EditingInline { coord, pending } => SelectionState::EditingInline {
                coord: clamp(coord),
                pending,
            },
            SelectionState::EditingExpanded { coord, pending } => {
                SelectionState::EditingExpanded {
                    coord: clamp(coord),
                    pending,
                }
            }
        };
    }

    /// Commit any open session and land on `CellActive` for its cell.
    fn close_session(&mut self) -> Option<CommitRequest> {
        let (coord, _, pending) = self.edit_session()?;
        let request = CommitRequest {
            coord,
            value: pending.to_string(),
        };
        self.state = SelectionState::CellActive(coord);
        Some(request)
    }
}

fn step(from: CellCoord, d_row: isize, d_col: isize, rows: usize, cols: usize) -> CellCoord {
    let row = from.row.saturating_add_signed(d_row).min(rows - 1);
    let col = from.col.saturating_add_signed(d_col).min(cols - 1);
    CellCoord::new(row, col)
}
