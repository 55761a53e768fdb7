use super::batch::{Axis, BatchPlan, classify};
use super::selection::{SelectionEvent, SelectionState};
use super::sheet::Sheet;
use super::sort::{SortOrder, sort_selection};
use super::viewport::{GridGeometry, ViewportWindower};
use crate::error::{MinisheetError, Result};
use log::info;
use minisheet_engine::engine::{Aggregate, CellRef, FormulaValue, Style, StylePatch};

/// UI-agnostic document state for the grid.
///
/// Owns the one sheet every view reads. All mutation goes through the
/// methods here, which bump [`Document::revision`] so persistence can tell
/// when a flush is due.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub sheet: Sheet,
    pub viewport: ViewportWindower,
    pub selection: SelectionState,
    /// Text of the condition panel.
    pub condition_code: String,
    revision: u64,
}

impl Document {
    /// Create an empty document. Side-effect free.
    pub fn new(geometry: GridGeometry) -> Self {
        Self::with_sheet(Sheet::new(), geometry)
    }

    pub fn with_sheet(sheet: Sheet, geometry: GridGeometry) -> Self {
        Document {
            sheet,
            viewport: ViewportWindower::new(geometry),
            selection: SelectionState::new(),
            condition_code: String::new(),
            revision: 0,
        }
    }

    /// Incremented on every sheet mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn mark_changed(&mut self) {
        self.revision += 1;
    }

    /// Feed a pointer/keyboard event to the selection state machine.
    pub fn handle(&mut self, event: SelectionEvent) -> Option<CellRef> {
        let committed = self.selection.handle(event, &mut self.sheet);
        if committed.is_some() {
            self.mark_changed();
        }
        let cursor = self.selection.cursor();
        let (row, col) = (cursor.row + 1, cursor.col + 1);
        self.viewport.ensure_contains(row, col);
        committed
    }

    /// Store typed input directly (command line, scripts).
    pub fn set_input(&mut self, cell_ref: CellRef, input: &str) {
        self.sheet.set_input(cell_ref, input);
        self.mark_changed();
    }

    /// Display text of a cell, recomputed from the current sheet.
    pub fn display(&self, cell_ref: &CellRef) -> String {
        self.sheet.display(cell_ref)
    }

    /// Merge `patch` into the pen style and into every selected cell.
    /// Returns the number of cells styled.
    pub fn apply_style(&mut self, patch: &StylePatch) -> usize {
        let mut pen = self.selection.pen().cloned().unwrap_or_else(Style::default);
        patch.apply(&mut pen);
        self.selection.set_pen(Some(pen));

        let targets = self.selection.selection().to_vec();
        if targets.is_empty() || patch.is_empty() {
            return 0;
        }
        self.sheet.apply_style(&targets, patch);
        self.mark_changed();
        targets.len()
    }

    /// Validate the selection for a batch aggregate.
    pub fn plan_batch(&self, aggregate: Aggregate) -> Result<BatchPlan> {
        let selection = self.selection.selection();
        let bound = match classify(selection)? {
            Axis::Row => self.viewport.num_rows(),
            Axis::Column => self.viewport.num_cols(),
        };
        BatchPlan::new(&self.sheet, selection, aggregate, bound)
    }

    /// Apply a planned batch with its result. The result cell is highlighted
    /// and the selection is cleared.
    pub fn commit_batch(&mut self, plan: &BatchPlan, result: f64) -> CellRef {
        let at = plan.commit(&mut self.sheet, result);
        info!("{} = {} written to {}", plan.aggregate.name(), result, at);
        self.selection.clear_selection();
        self.selection.set_highlight(Some(at.clone()));
        self.mark_changed();
        at
    }

    /// Plan, compute locally and commit.
    pub fn run_batch(&mut self, aggregate: Aggregate) -> Result<CellRef> {
        let plan = self.plan_batch(aggregate)?;
        let result = plan.local_result().ok_or(MinisheetError::EmptySelection)?;
        Ok(self.commit_batch(&plan, result))
    }

    /// Sort the selection's values in place.
    pub fn sort(&mut self, order: SortOrder) -> Result<usize> {
        let count = sort_selection(&mut self.sheet, self.selection.selection(), order)?;
        self.mark_changed();
        Ok(count)
    }

    /// Evaluate condition-panel text against the whole sheet.
    pub fn evaluate_condition(&self, code: &str) -> FormulaValue {
        let code = code.trim();
        let evaluator = self.sheet.evaluator();
        if code.starts_with('=') {
            evaluator.evaluate(code)
        } else {
            evaluator.evaluate_source(code)
        }
    }

    /// Replace the whole sheet (workbook import).
    pub fn replace_sheet(&mut self, sheet: Sheet) {
        self.sheet = sheet;
        self.selection = SelectionState::new();
        if let Some((col, row)) = self.sheet.extent() {
            self.viewport.ensure_contains(row + 1, col + 1);
        }
        self.mark_changed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NavKey;
    use minisheet_engine::engine::FontWeight;

    fn cell(key: &str) -> CellRef {
        CellRef::from_str(key).unwrap()
    }

    fn select(doc: &mut Document, from: &str, to: &str) {
        doc.handle(SelectionEvent::Press(cell(from)));
        doc.handle(SelectionEvent::Hover(cell(to)));
        doc.handle(SelectionEvent::Release);
    }

    #[test]
    fn test_batch_sum_highlights_and_clears_selection() {
        let mut doc = Document::default();
        doc.set_input(cell("A1"), "1");
        doc.set_input(cell("A2"), "2");
        doc.set_input(cell("A3"), "3");
        select(&mut doc, "A1", "A3");
        let before = doc.revision();
        let at = doc.run_batch(Aggregate::Sum).unwrap();
        assert_eq!(at, cell("A4"));
        assert_eq!(doc.display(&cell("A4")), "6");
        assert_eq!(doc.selection.highlight(), Some(&cell("A4")));
        assert!(doc.selection.selection().is_empty());
        assert!(doc.revision() > before);
    }

    #[test]
    fn test_batch_errors_leave_sheet_untouched() {
        let mut doc = Document::default();
        doc.set_input(cell("A1"), "1");
        assert!(matches!(doc.run_batch(Aggregate::Sum), Err(MinisheetError::EmptySelection)));
        select(&mut doc, "A1", "B2");
        let before = doc.sheet.clone();
        assert!(matches!(doc.run_batch(Aggregate::Sum), Err(MinisheetError::UnsupportedShape)));
        assert_eq!(doc.sheet, before);
    }

    #[test]
    fn test_style_applies_to_selection_and_pen() {
        let mut doc = Document::default();
        let bold = StylePatch {
            font_weight: Some(FontWeight::Bold),
            ..StylePatch::default()
        };
        // No selection: only the pen changes.
        assert_eq!(doc.apply_style(&bold), 0);
        assert!(doc.sheet.is_empty());
        assert!(doc.selection.pen().unwrap().is_bold());

        select(&mut doc, "B1", "B2");
        assert_eq!(doc.apply_style(&bold), 2);
        assert!(doc.sheet.style(&cell("B2")).unwrap().is_bold());
    }

    #[test]
    fn test_editing_bumps_revision_and_grows_viewport() {
        let mut doc = Document::new(GridGeometry {
            initial_rows: 2,
            ..GridGeometry::default()
        });
        doc.handle(SelectionEvent::Click(cell("A2")));
        doc.selection.set_buffer("x");
        let before = doc.revision();
        doc.handle(SelectionEvent::Navigate(NavKey::Down));
        assert_eq!(doc.revision(), before + 1);
        assert_eq!(doc.selection.editing(), Some(&cell("A3")));
        assert!(doc.viewport.num_rows() >= 3);
    }

    #[test]
    fn test_condition_evaluation() {
        let mut doc = Document::default();
        doc.set_input(cell("A1"), "12");
        let code = "IF(A1>10) PRINT(\"High\") ELSE PRINT(\"Low\")";
        assert_eq!(doc.evaluate_condition(code).to_string(), "High");
        assert_eq!(doc.evaluate_condition(&format!("={}", code)).to_string(), "High");
        assert_eq!(doc.evaluate_condition("IF(").to_string(), "#ERR");
    }

    #[test]
    fn test_sort_through_document() {
        let mut doc = Document::default();
        doc.set_input(cell("A1"), "3");
        doc.set_input(cell("A2"), "1");
        select(&mut doc, "A1", "A2");
        assert_eq!(doc.sort(SortOrder::Ascending).unwrap(), 2);
        assert_eq!(doc.sheet.raw(&cell("A1")), "1");
    }
}
