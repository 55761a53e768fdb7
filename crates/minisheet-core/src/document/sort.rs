//! In-place sort of a selection's values.
//!
//! Values are permuted across the selected positions; every position keeps
//! its own style.

use super::batch::ordered;
use super::sheet::Sheet;
use crate::error::{MinisheetError, Result};
use log::debug;
use minisheet_engine::engine::{Cell, CellRef, parse_number};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_name(name: &str) -> Option<SortOrder> {
        match name.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "a" => Some(SortOrder::Ascending),
            "desc" | "descending" | "d" => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

/// Sort raw values: numerically if every value is a number, else as strings.
pub fn sort_values(values: &mut [String], order: SortOrder) {
    let numbers: Option<Vec<f64>> = values.iter().map(|v| parse_number(v)).collect();
    if let Some(numbers) = numbers {
        let mut pairs: Vec<(f64, String)> = numbers.into_iter().zip(values.iter().cloned()).collect();
        pairs.sort_by(|a, b| {
            let ord = a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        for (slot, (_, value)) in values.iter_mut().zip(pairs) {
            *slot = value;
        }
    } else {
        values.sort_by(|a, b| match order {
            SortOrder::Ascending => a.cmp(b),
            SortOrder::Descending => b.cmp(a),
        });
    }
}

/// Sort the values of `selection` in place. Returns the number of cells written.
pub fn sort_selection(
    sheet: &mut Sheet,
    selection: &[CellRef],
    order: SortOrder,
) -> Result<usize> {
    if selection.is_empty() {
        return Err(MinisheetError::EmptySelection);
    }
    let cells = ordered(selection);
    let mut values: Vec<String> = cells.iter().map(|c| sheet.raw(c)).collect();
    sort_values(&mut values, order);
    debug!("sorting {} cells {:?}", cells.len(), order);

    let writes: Vec<_> = cells
        .into_iter()
        .zip(values)
        .map(|(cell_ref, value)| {
            let style = sheet.style(&cell_ref).cloned();
            (cell_ref, Cell::from_input(&value).with_style(style))
        })
        .collect();
    let count = writes.len();
    sheet.set_many(writes);
    Ok(count)
}
