//! Application state and logic.
//!
//! [`App`] wraps the UI-agnostic [`Document`] with what only the terminal
//! needs: the command line, the status line, the scroll position, debounced
//! persistence and the worker thread for remote calls.

use minisheet_core::document::{BatchPlan, Document, GridGeometry, ScrollState, SortOrder};
use minisheet_core::storage::{
    DebouncedWriter, LocalStore, RemoteClient, export_workbook, import_workbook, load_condition,
    load_sheet, save_condition, save_sheet,
};
use minisheet_core::{CellRef, MinisheetError};
use minisheet_engine::engine::{Aggregate, FontWeight, StylePatch, TextAlign};
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

/// Input routing for the keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Keys go to the grid (navigation, selection, inline editing).
    Grid,
    /// Keys go to the `:` command line.
    Command,
}

/// Result of a remote call, delivered back to the UI loop.
pub enum RemoteOutcome {
    Batch {
        plan: BatchPlan,
        result: minisheet_core::Result<f64>,
    },
    Condition {
        result: minisheet_core::Result<String>,
    },
}

pub struct App {
    pub doc: Document,
    pub mode: Mode,
    pub command_buffer: String,
    /// Byte offset within `command_buffer`.
    pub command_cursor: usize,
    pub status_message: String,
    /// Last condition-panel result.
    pub condition_result: Option<String>,
    /// First visible row/column (0-based).
    pub scroll_row: usize,
    pub scroll_col: usize,
    pub visible_rows: usize,
    pub visible_cols: usize,
    /// Cell the current mouse drag started on.
    pub drag_origin: Option<CellRef>,
    store: Option<LocalStore>,
    writer: DebouncedWriter,
    seen_revision: u64,
    remote: Option<RemoteClient>,
    pending: Option<Receiver<RemoteOutcome>>,
}

impl App {
    pub fn new(
        geometry: GridGeometry,
        store: Option<LocalStore>,
        debounce: Duration,
        remote: Option<RemoteClient>,
    ) -> Self {
        let mut doc = Document::new(geometry);
        if let Some(store) = &store {
            doc.replace_sheet(load_sheet(store));
            doc.condition_code = load_condition(store);
        }
        let seen_revision = doc.revision();
        App {
            doc,
            mode: Mode::Grid,
            command_buffer: String::new(),
            command_cursor: 0,
            status_message: String::new(),
            condition_result: None,
            scroll_row: 0,
            scroll_col: 0,
            visible_rows: 1,
            visible_cols: 1,
            drag_origin: None,
            store,
            writer: DebouncedWriter::new(debounce),
            seen_revision,
            remote,
            pending: None,
        }
    }

    /// Column width in terminal cells.
    pub fn col_width(&self) -> u16 {
        self.doc.viewport.geometry().col_width.max(1.0) as u16
    }

    /// Resize the visible area and feed the scroll position to the windower.
    pub fn set_visible(&mut self, rows: usize, cols: usize) {
        self.visible_rows = rows.max(1);
        self.visible_cols = cols.max(1);
        self.sync_viewport();
    }

    fn sync_viewport(&mut self) {
        let g = *self.doc.viewport.geometry();
        self.doc.viewport.on_scroll(ScrollState {
            scroll_x: self.scroll_col as f64 * g.col_width,
            scroll_y: self.scroll_row as f64 * g.row_height,
            width: self.visible_cols as f64 * g.col_width,
            height: self.visible_rows as f64 * g.row_height,
        });
    }

    /// Scroll by whole rows/columns (mouse wheel).
    pub fn scroll_by(&mut self, d_rows: isize, d_cols: isize) {
        self.scroll_row = self.scroll_row.saturating_add_signed(d_rows);
        self.scroll_col = self.scroll_col.saturating_add_signed(d_cols);
        self.sync_viewport();
    }

    /// Keep the cursor inside the visible area.
    pub fn scroll_to_cursor(&mut self) {
        let cursor = self.doc.selection.cursor().clone();
        if cursor.row < self.scroll_row {
            self.scroll_row = cursor.row;
        } else if cursor.row >= self.scroll_row.saturating_add(self.visible_rows) {
            self.scroll_row = cursor.row + 1 - self.visible_rows;
        }
        if cursor.col < self.scroll_col {
            self.scroll_col = cursor.col;
        } else if cursor.col >= self.scroll_col.saturating_add(self.visible_cols) {
            self.scroll_col = cursor.col + 1 - self.visible_cols;
        }
        self.sync_viewport();
    }

    /// Rows to draw (0-based): the windower's render range clipped to the screen.
    pub fn rows_on_screen(&self) -> Vec<usize> {
        self.doc
            .viewport
            .render_rows()
            .map(|row| row - 1)
            .filter(|row| *row >= self.scroll_row)
            .take(self.visible_rows)
            .collect()
    }

    pub fn cols_on_screen(&self) -> Vec<usize> {
        self.doc
            .viewport
            .render_cols()
            .map(|col| col - 1)
            .filter(|col| *col >= self.scroll_col)
            .take(self.visible_cols)
            .collect()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    // --- persistence ---

    /// Schedule a flush if the document changed since the last check.
    pub fn note_changes(&mut self, now: Instant) {
        let revision = self.doc.revision();
        if revision != self.seen_revision {
            self.seen_revision = revision;
            if self.store.is_some() {
                self.writer.schedule(now);
            }
        }
    }

    /// How long the event loop may block.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let idle = if self.is_busy() {
            Duration::from_millis(50)
        } else {
            Duration::from_millis(500)
        };
        self.writer
            .time_until_due(now)
            .map_or(idle, |due| due.min(idle))
    }

    pub fn tick(&mut self, now: Instant) {
        if self.writer.poll(now) {
            self.flush();
        }
        self.poll_remote();
    }

    fn flush(&mut self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = save_sheet(store, &self.doc.sheet) {
            error!("flush failed: {}", e);
            self.status_message = format!("Error: could not save: {}", e);
        }
    }

    /// Write any pending change before exit.
    pub fn shutdown(&mut self) {
        if self.writer.take_pending() {
            self.flush();
        }
    }

    // --- remote calls ---

    fn spawn_remote<F>(&mut self, job: F)
    where
        F: FnOnce() -> RemoteOutcome + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            // The UI may have quit already; nothing to deliver to then.
            let _ = tx.send(job());
        });
        self.pending = Some(rx);
    }

    fn poll_remote(&mut self) {
        let Some(rx) = &self.pending else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.status_message = "Error: remote worker stopped".to_string();
                return;
            }
        };
        self.pending = None;
        match outcome {
            RemoteOutcome::Batch { plan, result } => match result {
                Ok(value) => {
                    let at = self.doc.commit_batch(&plan, value);
                    self.status_message = format!("{} -> {}", plan.aggregate.name(), at);
                }
                Err(e) => {
                    warn!("remote {} failed: {}", plan.aggregate.name(), e);
                    self.status_message = format!("Error: {}", e);
                }
            },
            RemoteOutcome::Condition { result } => match result {
                Ok(text) => self.condition_result = Some(text),
                Err(e) => {
                    self.condition_result = Some(format!("#ERR ({})", e));
                }
            },
        }
    }

    // --- operations ---

    pub fn run_aggregate(&mut self, aggregate: Aggregate) {
        if self.is_busy() {
            self.status_message = "Busy: waiting for the remote service".to_string();
            return;
        }
        let plan = match self.doc.plan_batch(aggregate) {
            Ok(plan) => plan,
            Err(e) => {
                self.status_message = format!("Error: {}", e);
                return;
            }
        };
        match self.remote.clone() {
            Some(client) => {
                self.status_message = format!("{}...", aggregate.name());
                self.spawn_remote(move || {
                    let result = client.math(aggregate, &plan.values);
                    RemoteOutcome::Batch { plan, result }
                });
            }
            None => match plan.local_result() {
                Some(value) => {
                    let at = self.doc.commit_batch(&plan, value);
                    self.status_message = format!("{} -> {}", aggregate.name(), at);
                }
                None => self.status_message = format!("Error: {}", MinisheetError::EmptySelection),
            },
        }
    }

    pub fn sort(&mut self, order: SortOrder) {
        match self.doc.sort(order) {
            Ok(count) => self.status_message = format!("Sorted {} cells", count),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    pub fn apply_style(&mut self, patch: StylePatch) {
        let count = self.doc.apply_style(&patch);
        self.status_message = if count == 0 {
            "Style set for new cells".to_string()
        } else {
            format!("Styled {} cells", count)
        };
    }

    pub fn evaluate_condition(&mut self, code: Option<&str>) {
        if let Some(code) = code {
            self.doc.condition_code = code.to_string();
            if let Some(store) = &self.store
                && let Err(e) = save_condition(store, code)
            {
                warn!("could not save condition: {}", e);
            }
        }
        let code = self.doc.condition_code.clone();
        if code.trim().is_empty() {
            self.status_message = "Usage: :cond <formula>".to_string();
            return;
        }
        match self.remote.clone() {
            Some(client) if !self.is_busy() => {
                let sheet = self.doc.sheet.clone();
                self.condition_result = Some("...".to_string());
                self.spawn_remote(move || RemoteOutcome::Condition {
                    result: client.formula(&code, &sheet),
                });
            }
            Some(_) => {
                self.status_message = "Busy: waiting for the remote service".to_string();
            }
            None => {
                self.condition_result = Some(self.doc.evaluate_condition(&code).to_string());
            }
        }
    }

    pub fn export(&mut self, path: &str) {
        match export_workbook(&self.doc.sheet, &PathBuf::from(path)) {
            Ok(()) => self.status_message = format!("Exported to {}", path),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    pub fn import(&mut self, path: &str) {
        match import_workbook(&PathBuf::from(path)) {
            Ok(sheet) => {
                let count = sheet.len();
                self.doc.replace_sheet(sheet);
                self.scroll_row = 0;
                self.scroll_col = 0;
                self.sync_viewport();
                info!("loaded {}", path);
                self.status_message = format!("Imported {} cells from {}", count, path);
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    pub fn goto_cell(&mut self, key: &str) {
        let Some(cell_ref) = CellRef::from_str(key) else {
            self.status_message = format!("Invalid cell reference: {}", key);
            return;
        };
        self.doc.selection.select_range(cell_ref.clone(), cell_ref.clone());
        self.doc.viewport.ensure_contains(cell_ref.row + 1, cell_ref.col + 1);
        self.scroll_to_cursor();
    }

    /// Execute the command line. Returns true when the app should quit.
    pub fn execute_command(&mut self) -> bool {
        let cmd = self.command_buffer.trim().to_string();
        self.command_buffer.clear();
        self.command_cursor = 0;
        self.mode = Mode::Grid;

        let (command, args) = match cmd.split_once(' ') {
            Some((command, args)) => (command, Some(args.trim()).filter(|a| !a.is_empty())),
            None => (cmd.as_str(), None),
        };

        if let Some(aggregate) = Aggregate::from_name(command) {
            self.run_aggregate(aggregate);
            return false;
        }

        match command {
            "" => {}
            "q" | "quit" => return true,
            "sort" => match args.map(SortOrder::from_name) {
                Some(Some(order)) => self.sort(order),
                None => self.sort(SortOrder::Ascending),
                Some(None) => self.status_message = "Usage: :sort [asc|desc]".to_string(),
            },
            "font" => match args {
                Some(name) => self.apply_style(StylePatch {
                    font_family: Some(name.to_string()),
                    ..StylePatch::default()
                }),
                None => self.status_message = "Usage: :font <family>".to_string(),
            },
            "size" => match args.and_then(|a| a.parse::<u16>().ok()).filter(|s| *s > 0) {
                Some(size) => self.apply_style(StylePatch {
                    font_size: Some(size),
                    ..StylePatch::default()
                }),
                None => self.status_message = "Usage: :size <points>".to_string(),
            },
            "align" => match args.and_then(TextAlign::from_name) {
                Some(align) => self.apply_style(StylePatch {
                    text_align: Some(align),
                    ..StylePatch::default()
                }),
                None => self.status_message = "Usage: :align left|center|right".to_string(),
            },
            "bold" => {
                let bold = match args {
                    Some("off") => false,
                    Some("on") => true,
                    _ => !self.doc.selection.pen().is_some_and(|pen| pen.is_bold()),
                };
                let weight = if bold { FontWeight::Bold } else { FontWeight::Normal };
                self.apply_style(StylePatch {
                    font_weight: Some(weight),
                    ..StylePatch::default()
                });
            }
            "cond" => self.evaluate_condition(args),
            "w" | "export" => match args {
                Some(path) => self.export(path),
                None => self.status_message = "Usage: :w <file.xlsx>".to_string(),
            },
            "e" | "import" => match args {
                Some(path) => self.import(path),
                None => self.status_message = "Usage: :e <file.xlsx>".to_string(),
            },
            "goto" | "g" => match args {
                Some(key) => self.goto_cell(key),
                None => self.status_message = "Usage: :goto CELL (e.g., :goto A100)".to_string(),
            },
            _ => self.status_message = format!("Unknown command: {}", command),
        }
        false
    }
}
