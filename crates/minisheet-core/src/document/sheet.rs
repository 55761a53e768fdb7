//! Sparse cell store.
//!
//! A [`Sheet`] maps cell references to cells. An absent key is an empty cell;
//! writing an empty cell removes the key rather than storing a tombstone.

use crate::error::{MinisheetError, Result};
use minisheet_engine::engine::{
    Cell, CellRef, CellType, FormulaEvaluator, FormulaValue, NumericSnapshot, Style, StylePatch,
};
use std::collections::HashMap;
use std::sync::Arc;

/// The full mapping from cell reference to cell content.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    cells: HashMap<CellRef, Cell>,
}

impl Sheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cell_ref: &CellRef) -> Option<&Cell> {
        self.cells.get(cell_ref)
    }

    /// Look up an externally supplied key such as `"B12"`.
    pub fn get_key(&self, key: &str) -> Result<Option<&Cell>> {
        let cell_ref = parse_cell_key(key)?;
        Ok(self.cells.get(&cell_ref))
    }

    /// Content at `cell_ref`; `Empty` when the key is absent.
    pub fn content(&self, cell_ref: &CellRef) -> CellType {
        self.cells
            .get(cell_ref)
            .map(|cell| cell.contents.clone())
            .unwrap_or(CellType::Empty)
    }

    pub fn style(&self, cell_ref: &CellRef) -> Option<&Style> {
        self.cells.get(cell_ref).and_then(|cell| cell.style.as_ref())
    }

    /// Raw text as typed, `""` when absent.
    pub fn raw(&self, cell_ref: &CellRef) -> String {
        self.cells
            .get(cell_ref)
            .map(Cell::to_input_string)
            .unwrap_or_default()
    }

    /// Store `cell` at `cell_ref`; an empty cell removes the key.
    pub fn set(&mut self, cell_ref: CellRef, cell: Cell) {
        if cell.is_empty() {
            self.cells.remove(&cell_ref);
        } else {
            self.cells.insert(cell_ref, cell);
        }
    }

    /// Store typed input, keeping the cell's existing style.
    pub fn set_input(&mut self, cell_ref: CellRef, input: &str) {
        let style = self.style(&cell_ref).cloned();
        self.set(cell_ref, Cell::from_input(input).with_style(style));
    }

    /// Apply a batch of writes. Every write lands before the next read.
    pub fn set_many<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (CellRef, Cell)>,
    {
        for (cell_ref, cell) in cells {
            self.set(cell_ref, cell);
        }
    }

    /// Apply a batch keyed by external cell keys. Nothing is written unless
    /// every key is valid.
    pub fn set_many_keys<I, K>(&mut self, cells: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Cell)>,
        K: AsRef<str>,
    {
        let parsed = cells
            .into_iter()
            .map(|(key, cell)| parse_cell_key(key.as_ref()).map(|cell_ref| (cell_ref, cell)))
            .collect::<Result<Vec<_>>>()?;
        self.set_many(parsed);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellRef, &Cell)> {
        self.cells.iter()
    }

    /// Cell references in row-major order.
    pub fn sorted_refs(&self) -> Vec<CellRef> {
        let mut refs: Vec<CellRef> = self.cells.keys().cloned().collect();
        refs.sort();
        refs
    }

    /// Every stored cell coerced to a number (non-numeric is `0`).
    pub fn snapshot_numeric(&self) -> NumericSnapshot {
        self.cells
            .iter()
            .map(|(cell_ref, cell)| (cell_ref.clone(), cell.numeric()))
            .collect()
    }

    /// An evaluator over the current contents.
    pub fn evaluator(&self) -> FormulaEvaluator {
        FormulaEvaluator::new(Arc::new(self.snapshot_numeric()))
    }

    /// Evaluated value of a cell.
    pub fn value_with(&self, evaluator: &FormulaEvaluator, cell_ref: &CellRef) -> FormulaValue {
        match self.cells.get(cell_ref).map(|cell| &cell.contents) {
            None | Some(CellType::Empty) => FormulaValue::Empty,
            Some(CellType::Value(text)) => FormulaValue::Text(text.clone()),
            Some(CellType::Formula(source)) => evaluator.evaluate_source(source),
        }
    }

    /// Display text of a cell. Formulas are recomputed on every call.
    pub fn display_with(&self, evaluator: &FormulaEvaluator, cell_ref: &CellRef) -> String {
        self.value_with(evaluator, cell_ref).to_string()
    }

    pub fn display(&self, cell_ref: &CellRef) -> String {
        self.display_with(&self.evaluator(), cell_ref)
    }

    /// Highest occupied (col, row), if any cell has a value.
    pub fn extent(&self) -> Option<(usize, usize)> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.has_value())
            .fold(None, |acc, (cell_ref, _)| match acc {
                None => Some((cell_ref.col, cell_ref.row)),
                Some((col, row)) => Some((col.max(cell_ref.col), row.max(cell_ref.row))),
            })
    }

    /// Highest occupied row index in `col`.
    pub fn last_row_in_col(&self, col: usize) -> Option<usize> {
        self.cells
            .keys()
            .filter(|cell_ref| cell_ref.col == col)
            .map(|cell_ref| cell_ref.row)
            .max()
    }

    /// Highest occupied column index in `row`.
    pub fn last_col_in_row(&self, row: usize) -> Option<usize> {
        self.cells
            .keys()
            .filter(|cell_ref| cell_ref.row == row)
            .map(|cell_ref| cell_ref.col)
            .max()
    }

    /// Merge a partial style into each cell, creating styled blank cells as needed.
    pub fn apply_style<'a, I>(&mut self, cells: I, patch: &StylePatch)
    where
        I: IntoIterator<Item = &'a CellRef>,
    {
        if patch.is_empty() {
            return;
        }
        for cell_ref in cells {
            let cell = self
                .cells
                .entry(cell_ref.clone())
                .or_insert_with(Cell::new_empty);
            let style = cell.style.get_or_insert_with(Style::default);
            patch.apply(style);
        }
    }
}

/// Parse an external cell key, reporting `InvalidKey` on failure.
pub fn parse_cell_key(key: &str) -> Result<CellRef> {
    key.parse::<CellRef>()
        .map_err(|_| MinisheetError::InvalidKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minisheet_engine::engine::{FontWeight, TextAlign};

    fn cell(key: &str) -> CellRef {
        CellRef::from_str(key).unwrap()
    }

    #[test]
    fn test_set_empty_removes_key() {
        let mut sheet = Sheet::new();
        sheet.set_input(cell("A1"), "5");
        assert_eq!(sheet.len(), 1);
        sheet.set_input(cell("A1"), "");
        assert!(sheet.is_empty());
        assert_eq!(sheet.content(&cell("A1")), CellType::Empty);
        assert_eq!(sheet.content(&cell("Z99")), CellType::Empty);
    }

    #[test]
    fn test_set_input_keeps_style() {
        let mut sheet = Sheet::new();
        sheet.set(cell("B2"), Cell::new_value("x").with_style(Some(Style::emphasis())));
        sheet.set_input(cell("B2"), "y");
        assert_eq!(sheet.content(&cell("B2")), CellType::Value("y".into()));
        assert!(sheet.style(&cell("B2")).unwrap().is_bold());

        // Clearing the value leaves a styled blank cell behind.
        sheet.set_input(cell("B2"), "");
        assert_eq!(sheet.len(), 1);
        assert!(!sheet.get(&cell("B2")).unwrap().has_value());
    }

    #[test]
    fn test_get_key_rejects_malformed_keys() {
        let sheet = Sheet::new();
        assert!(matches!(sheet.get_key("3B"), Err(MinisheetError::InvalidKey(_))));
        assert!(sheet.get_key("B3").unwrap().is_none());
    }

    #[test]
    fn test_set_many_keys_is_all_or_nothing() {
        let mut sheet = Sheet::new();
        let result = sheet.set_many_keys([("A1", Cell::new_value("1")), ("1A", Cell::new_value("2"))]);
        assert!(result.is_err());
        assert!(sheet.is_empty());

        sheet
            .set_many_keys([("A1", Cell::new_value("1")), ("B1", Cell::new_value("2"))])
            .unwrap();
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_snapshot_coerces_to_numbers() {
        let mut sheet = Sheet::new();
        sheet.set_input(cell("A1"), "3");
        sheet.set_input(cell("A2"), "hello");
        sheet.set_input(cell("A3"), "=A1*2");
        let snap = sheet.snapshot_numeric();
        assert_eq!(snap[&cell("A1")], 3.0);
        assert_eq!(snap[&cell("A2")], 0.0);
        assert_eq!(snap[&cell("A3")], 0.0);
    }

    #[test]
    fn test_display_evaluates_formulas() {
        let mut sheet = Sheet::new();
        sheet.set_input(cell("A1"), "3");
        sheet.set_input(cell("B1"), "4");
        sheet.set_input(cell("C1"), "=A1+B1");
        sheet.set_input(cell("D1"), "=(");
        assert_eq!(sheet.display(&cell("C1")), "7");
        assert_eq!(sheet.display(&cell("D1")), "#ERR");
        assert_eq!(sheet.display(&cell("A1")), "3");
        assert_eq!(sheet.display(&cell("E1")), "");
        // The failed formula leaves the sheet untouched.
        assert_eq!(sheet.raw(&cell("D1")), "=(");
    }

    #[test]
    fn test_extent_ignores_styled_blanks() {
        let mut sheet = Sheet::new();
        assert_eq!(sheet.extent(), None);
        sheet.set_input(cell("C2"), "x");
        sheet.set_input(cell("A5"), "y");
        sheet.apply_style([&cell("J20")], &StylePatch {
            font_weight: Some(FontWeight::Bold),
            ..StylePatch::default()
        });
        assert_eq!(sheet.extent(), Some((2, 4)));
    }

    #[test]
    fn test_apply_style_merges_into_selection() {
        let mut sheet = Sheet::new();
        sheet.set_input(cell("A1"), "1");
        let targets = [cell("A1"), cell("A2")];
        sheet.apply_style(&targets, &StylePatch {
            text_align: Some(TextAlign::Center),
            ..StylePatch::default()
        });
        sheet.apply_style(&targets, &StylePatch {
            font_size: Some(18),
            ..StylePatch::default()
        });
        for target in &targets {
            let style = sheet.style(target).unwrap();
            assert_eq!(style.text_align, TextAlign::Center);
            assert_eq!(style.font_size, 18);
        }
        assert_eq!(sheet.content(&cell("A1")), CellType::Value("1".into()));
        assert!(!sheet.get(&cell("A2")).unwrap().has_value());
    }

    #[test]
    fn test_last_occupied_indices() {
        let mut sheet = Sheet::new();
        sheet.set_input(cell("B3"), "1");
        sheet.set_input(cell("B9"), "1");
        sheet.set_input(cell("F3"), "1");
        assert_eq!(sheet.last_row_in_col(1), Some(8));
        assert_eq!(sheet.last_col_in_row(2), Some(5));
        assert_eq!(sheet.last_row_in_col(0), None);
    }
}
