//! Selection and navigation state machine.
//!
//! ```text
//! Idle      --Press(k)-------> Selecting   anchor := k
//! Selecting --Hover(k)-------> Selecting   selection := rect(anchor, k)
//! Selecting --Release--------> Idle        selection kept
//! any       --Click(k)-------> Editing(k)  buffer := raw(k)
//! Editing   --Blur-----------> Idle        commit
//! Editing   --Navigate(key)--> Editing(n)  commit, then move
//! any       --Escape---------> Idle        buffer discarded, selection cleared
//! any       --DismissOutside-> Idle        commit, selection cleared
//! ```
//!
//! Commits go through the [`Sheet`] handle passed to [`SelectionState::handle`].

use super::sheet::Sheet;
use minisheet_engine::engine::{Cell, CellRef, Style};

/// Directional and commit keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Tab,
}

impl NavKey {
    /// Neighbor of `cell` in this direction. Left/up clamp at column A / row 1.
    pub fn step(self, cell: &CellRef) -> CellRef {
        match self {
            NavKey::Up => cell.offset(0, -1),
            NavKey::Down | NavKey::Enter => cell.next_row(),
            NavKey::Left => cell.offset(-1, 0),
            NavKey::Right | NavKey::Tab => cell.next_col(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    /// Pointer pressed on a cell.
    Press(CellRef),
    /// Pointer moved onto a cell.
    Hover(CellRef),
    /// Pointer released.
    Release,
    /// Cell clicked: edit it.
    Click(CellRef),
    /// Edit surface lost focus.
    Blur,
    Navigate(NavKey),
    /// Move the cursor and grow the selection from its anchor.
    Extend(NavKey),
    Escape,
    /// Pointer pressed outside the grid and its controls.
    DismissOutside,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Selecting,
    Editing(CellRef),
}

/// Every cell of the rectangle spanned by `a` and `b`, row-major.
pub fn rectangle(a: &CellRef, b: &CellRef) -> Vec<CellRef> {
    let (row_lo, row_hi) = (a.row.min(b.row), a.row.max(b.row));
    let (col_lo, col_hi) = (a.col.min(b.col), a.col.max(b.col));
    let mut cells = Vec::with_capacity((row_hi - row_lo + 1) * (col_hi - col_lo + 1));
    for row in row_lo..=row_hi {
        for col in col_lo..=col_hi {
            cells.push(CellRef::new(col, row));
        }
    }
    cells
}

#[derive(Clone, Debug)]
pub struct SelectionState {
    mode: Mode,
    anchor: Option<CellRef>,
    selection: Vec<CellRef>,
    cursor: CellRef,
    buffer: String,
    highlight: Option<CellRef>,
    pen: Option<Style>,
}

impl Default for SelectionState {
    fn default() -> Self {
        SelectionState {
            mode: Mode::Idle,
            anchor: None,
            selection: Vec::new(),
            cursor: CellRef::new(0, 0),
            buffer: String::new(),
            highlight: None,
            pen: None,
        }
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn editing(&self) -> Option<&CellRef> {
        match &self.mode {
            Mode::Editing(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing().is_some()
    }

    /// Selected cells in row-major order.
    pub fn selection(&self) -> &[CellRef] {
        &self.selection
    }

    pub fn is_selected(&self, cell: &CellRef) -> bool {
        self.selection.contains(cell)
    }

    pub fn anchor(&self) -> Option<&CellRef> {
        self.anchor.as_ref()
    }

    pub fn cursor(&self) -> &CellRef {
        &self.cursor
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn highlight(&self) -> Option<&CellRef> {
        self.highlight.as_ref()
    }

    pub fn set_highlight(&mut self, cell: Option<CellRef>) {
        self.highlight = cell;
    }

    /// Style given to committed cells that have none.
    pub fn pen(&self) -> Option<&Style> {
        self.pen.as_ref()
    }

    pub fn set_pen(&mut self, pen: Option<Style>) {
        self.pen = pen;
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.anchor = None;
    }

    /// Replace the selection with the rectangle `a`..`b`, cursor at `b`.
    pub fn select_range(&mut self, a: CellRef, b: CellRef) {
        self.selection = rectangle(&a, &b);
        self.anchor = Some(a);
        self.cursor = b;
        if self.mode == Mode::Selecting {
            self.mode = Mode::Idle;
        }
    }

    pub fn push_char(&mut self, c: char) {
        if self.is_editing() {
            self.buffer.push(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.is_editing() {
            self.buffer.pop();
        }
    }

    pub fn set_buffer(&mut self, text: &str) {
        if self.is_editing() {
            self.buffer = text.to_string();
        }
    }

    /// Apply one event. Returns the cell whose content was committed, if any.
    pub fn handle(&mut self, event: SelectionEvent, sheet: &mut Sheet) -> Option<CellRef> {
        match event {
            SelectionEvent::Press(cell) => {
                let committed = self.commit(sheet);
                self.mode = Mode::Selecting;
                self.anchor = Some(cell.clone());
                self.selection = vec![cell.clone()];
                self.cursor = cell;
                committed
            }
            SelectionEvent::Hover(cell) => {
                if self.mode == Mode::Selecting
                    && let Some(anchor) = &self.anchor
                {
                    self.selection = rectangle(anchor, &cell);
                    self.cursor = cell;
                }
                None
            }
            SelectionEvent::Release => {
                if self.mode == Mode::Selecting {
                    self.mode = Mode::Idle;
                }
                None
            }
            SelectionEvent::Click(cell) => {
                let committed = if self.editing() == Some(&cell) {
                    None
                } else {
                    let committed = self.commit(sheet);
                    self.start_edit(cell, sheet);
                    committed
                };
                self.highlight = None;
                committed
            }
            SelectionEvent::Blur => {
                let committed = self.commit(sheet);
                self.mode = Mode::Idle;
                committed
            }
            SelectionEvent::Navigate(key) => match self.mode.clone() {
                Mode::Editing(cell) => {
                    let committed = self.commit(sheet);
                    self.start_edit(key.step(&cell), sheet);
                    committed
                }
                Mode::Idle | Mode::Selecting => {
                    self.mode = Mode::Idle;
                    self.clear_selection();
                    if key == NavKey::Enter {
                        self.start_edit(self.cursor.clone(), sheet);
                    } else {
                        self.cursor = key.step(&self.cursor);
                    }
                    None
                }
            },
            SelectionEvent::Extend(key) => {
                let committed = self.commit(sheet);
                self.mode = Mode::Idle;
                let anchor = self.anchor.get_or_insert_with(|| self.cursor.clone()).clone();
                self.cursor = key.step(&self.cursor);
                self.selection = rectangle(&anchor, &self.cursor);
                committed
            }
            SelectionEvent::Escape => {
                self.buffer.clear();
                self.mode = Mode::Idle;
                self.clear_selection();
                self.highlight = None;
                None
            }
            SelectionEvent::DismissOutside => {
                let committed = self.commit(sheet);
                self.mode = Mode::Idle;
                self.clear_selection();
                committed
            }
        }
    }

    fn start_edit(&mut self, cell: CellRef, sheet: &Sheet) {
        self.buffer = sheet.raw(&cell);
        self.cursor = cell.clone();
        self.mode = Mode::Editing(cell);
    }

    /// Write the edit buffer back if it changed. Leaves the mode untouched.
    fn commit(&mut self, sheet: &mut Sheet) -> Option<CellRef> {
        let cell_ref = self.editing()?.clone();
        let buffer = std::mem::take(&mut self.buffer);
        if buffer == sheet.raw(&cell_ref) {
            return None;
        }
        let style = sheet.style(&cell_ref).cloned().or_else(|| self.pen.clone());
        sheet.set(cell_ref.clone(), Cell::from_input(&buffer).with_style(style));
        Some(cell_ref)
    }
}
