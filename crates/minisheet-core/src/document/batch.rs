//! Aggregate-and-insert over a selection.
//!
//! A batch operation computes an aggregate over a single-row or single-column
//! selection and inserts the result just past it, shifting the rest of that
//! line by one cell. Planning reads the sheet; committing writes it. The
//! aggregate itself may come from [`BatchPlan::local_result`] or from the
//! remote math endpoint, so nothing is written until a result is in hand.

use super::sheet::Sheet;
use crate::error::{MinisheetError, Result};
use log::debug;
use minisheet_engine::engine::{Aggregate, Cell, CellRef, Style, format_number};
use std::collections::BTreeSet;

/// Line a batch result is inserted along.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Single-column selection: shift down, insert below.
    Row,
    /// Single-row selection: shift right, insert to the right.
    Column,
}

impl Axis {
    fn get_coord(&self, cell_ref: &CellRef) -> usize {
        match self {
            Axis::Row => cell_ref.row,
            Axis::Column => cell_ref.col,
        }
    }

    fn new_cell_ref(&self, cell_ref: &CellRef, new_coord: usize) -> CellRef {
        match self {
            Axis::Row => CellRef::new(cell_ref.col, new_coord),
            Axis::Column => CellRef::new(new_coord, cell_ref.row),
        }
    }
}

/// Classify a selection: single column first, then single row.
pub fn classify(selection: &[CellRef]) -> Result<Axis> {
    if selection.is_empty() {
        return Err(MinisheetError::EmptySelection);
    }
    let cols: BTreeSet<usize> = selection.iter().map(|c| c.col).collect();
    if cols.len() == 1 {
        return Ok(Axis::Row);
    }
    let rows: BTreeSet<usize> = selection.iter().map(|c| c.row).collect();
    if rows.len() == 1 {
        return Ok(Axis::Column);
    }
    Err(MinisheetError::UnsupportedShape)
}

/// Selected cells in row-major order, without duplicates.
pub fn ordered(selection: &[CellRef]) -> Vec<CellRef> {
    let set: BTreeSet<CellRef> = selection.iter().cloned().collect();
    set.into_iter().collect()
}

/// Numeric values of the selection in row order (non-numeric is `0`).
pub fn collect_values(sheet: &Sheet, selection: &[CellRef]) -> Vec<f64> {
    ordered(selection)
        .iter()
        .map(|cell_ref| sheet.get(cell_ref).map(Cell::numeric).unwrap_or(0.0))
        .collect()
}

/// A validated batch operation, ready to commit once its result is known.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchPlan {
    pub aggregate: Aggregate,
    pub axis: Axis,
    pub values: Vec<f64>,
    /// Where the result is written.
    pub insert_at: CellRef,
    /// Logical row or column count on the shift axis.
    pub bound: usize,
}

impl BatchPlan {
    /// Validate `selection` and gather its values. `bound` is the logical
    /// row count (single column) or column count (single row).
    pub fn new(
        sheet: &Sheet,
        selection: &[CellRef],
        aggregate: Aggregate,
        bound: usize,
    ) -> Result<BatchPlan> {
        let axis = classify(selection)?;
        let cells = ordered(selection);
        let values = collect_values(sheet, &cells);
        let last = cells
            .iter()
            .max_by_key(|c| axis.get_coord(c))
            .ok_or(MinisheetError::EmptySelection)?;
        let insert_at = axis.new_cell_ref(last, axis.get_coord(last) + 1);
        debug!(
            "batch {} over {} cells, inserting at {}",
            aggregate.name(),
            values.len(),
            insert_at
        );
        Ok(BatchPlan {
            aggregate,
            axis,
            values,
            insert_at,
            bound,
        })
    }

    /// The aggregate computed locally.
    pub fn local_result(&self) -> Option<f64> {
        self.aggregate.apply(&self.values)
    }

    /// The writes `commit` performs, in application order: the shift from the
    /// far edge back towards the insertion point, then the result.
    pub fn writes(&self, sheet: &Sheet, result: f64) -> Vec<(CellRef, Cell)> {
        let axis = self.axis;
        let insert = axis.get_coord(&self.insert_at);
        let occupied = match axis {
            Axis::Row => sheet.last_row_in_col(self.insert_at.col),
            Axis::Column => sheet.last_col_in_row(self.insert_at.row),
        };
        let far = occupied.unwrap_or(0).max(self.bound.saturating_sub(1));

        let mut writes = Vec::new();
        if far >= insert {
            for coord in (insert..=far).rev() {
                let from = axis.new_cell_ref(&self.insert_at, coord);
                let to = axis.new_cell_ref(&self.insert_at, coord + 1);
                let moved = sheet.get(&from).cloned().unwrap_or_else(Cell::new_empty);
                writes.push((to, moved));
            }
        }
        let cell = Cell::new_value(&format_number(result)).with_style(Some(Style::emphasis()));
        writes.push((self.insert_at.clone(), cell));
        writes
    }

    /// Shift and insert. Returns the cell holding the result.
    pub fn commit(&self, sheet: &mut Sheet, result: f64) -> CellRef {
        let writes = self.writes(sheet, result);
        debug!("batch commit: {} writes", writes.len());
        sheet.set_many(writes);
        self.insert_at.clone()
    }
}
