//! Workbook import (calamine) and export (rust_xlsxwriter).

use crate::document::Sheet;
use crate::error::{MinisheetError, Result};
use calamine::{Data, Reader, open_workbook_auto};
use log::info;
use minisheet_engine::engine::{CellRef, Style, TextAlign, format_number};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use std::path::Path;

/// Read the first worksheet of any workbook calamine can open.
/// Blank source cells are skipped.
pub fn import_workbook(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path)?;
    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| MinisheetError::Workbook(format!("{} has no worksheets", path.display())))?;
    let range = workbook.worksheet_range(&name)?;
    let (start_row, start_col) = range.start().unwrap_or((0, 0));

    let mut sheet = Sheet::new();
    for (row_idx, row) in range.rows().enumerate() {
        for (col_idx, data) in row.iter().enumerate() {
            let Some(text) = data_text(data) else {
                continue;
            };
            let cell_ref = CellRef::new(start_col as usize + col_idx, start_row as usize + row_idx);
            sheet.set_input(cell_ref, &text);
        }
    }
    info!("imported {} cells from {} [{}]", sheet.len(), path.display(), name);
    Ok(sheet)
}

fn data_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{}", e),
    };
    if text.trim().is_empty() { None } else { Some(text) }
}

fn cell_format(style: Option<&Style>) -> Format {
    let Some(style) = style else {
        return Format::new();
    };
    let mut format = Format::new()
        .set_font_name(&style.font_family)
        .set_font_size(style.font_size);
    format = match style.text_align {
        TextAlign::Left => format.set_align(FormatAlign::Left),
        TextAlign::Center => format.set_align(FormatAlign::Center),
        TextAlign::Right => format.set_align(FormatAlign::Right),
    };
    if style.is_bold() {
        format = format.set_bold();
    }
    format
}

fn write_cells(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<usize> {
    let mut written = 0;
    for cell_ref in sheet.sorted_refs() {
        let Some(cell) = sheet.get(&cell_ref) else {
            continue;
        };
        if !cell.has_value() {
            continue;
        }
        let row = u32::try_from(cell_ref.row)
            .map_err(|_| MinisheetError::Workbook(format!("row out of range at {}", cell_ref)))?;
        let col = u16::try_from(cell_ref.col)
            .map_err(|_| MinisheetError::Workbook(format!("column out of range at {}", cell_ref)))?;
        let format = cell_format(cell.style.as_ref());
        let raw = cell.to_input_string();
        match cell.as_number() {
            Some(n) => worksheet.write_number_with_format(row, col, n, &format)?,
            None => worksheet.write_string_with_format(row, col, &raw, &format)?,
        };
        written += 1;
    }
    Ok(written)
}

fn build_workbook(sheet: &Sheet) -> Result<(Workbook, usize)> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let written = write_cells(sheet, worksheet)?;
    Ok((workbook, written))
}

/// Write the sheet as a single-worksheet xlsx file.
pub fn export_workbook(sheet: &Sheet, path: &Path) -> Result<()> {
    let (mut workbook, written) = build_workbook(sheet)?;
    workbook.save(path)?;
    info!("exported {} cells to {}", written, path.display());
    Ok(())
}

/// Workbook bytes, for callers that hand the file elsewhere.
pub fn export_to_buffer(sheet: &Sheet) -> Result<Vec<u8>> {
    let (mut workbook, _) = build_workbook(sheet)?;
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use minisheet_engine::engine::Cell;
    use tempfile::TempDir;

    fn cell(key: &str) -> CellRef {
        CellRef::from_str(key).unwrap()
    }

    #[test]
    fn test_export_import_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");

        let mut sheet = Sheet::new();
        sheet.set_input(cell("A1"), "Name");
        sheet.set_input(cell("B1"), "Score");
        sheet.set_input(cell("A2"), "ada");
        sheet.set_input(cell("B2"), "12");
        sheet.set_input(cell("B3"), "2.5");
        sheet.set_input(cell("C4"), "=B2*2");
        sheet.set(cell("D1"), Cell::new_value("total").with_style(Some(Style::emphasis())));
        export_workbook(&sheet, &path).unwrap();

        let loaded = import_workbook(&path).unwrap();
        assert_eq!(loaded.raw(&cell("A1")), "Name");
        assert_eq!(loaded.raw(&cell("B2")), "12");
        assert_eq!(loaded.raw(&cell("B3")), "2.5");
        assert_eq!(loaded.raw(&cell("C4")), "=B2*2");
        assert_eq!(loaded.raw(&cell("D1")), "total");
        assert!(loaded.get(&cell("A3")).is_none());
        assert_eq!(loaded.len(), 6);
        assert_eq!(loaded.display(&cell("C4")), "24");
    }

    #[test]
    fn test_roundtrip_keeps_full_precision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("precise.xlsx");

        let inputs = [("A1", "0.123456789012"), ("A2", "1e-12"), ("A3", "3.14159265358979")];
        let mut sheet = Sheet::new();
        for (key, text) in inputs {
            sheet.set_input(cell(key), text);
        }
        export_workbook(&sheet, &path).unwrap();

        let loaded = import_workbook(&path).unwrap();
        for (key, _) in inputs {
            let before = sheet.get(&cell(key)).and_then(|c| c.as_number());
            let after = loaded.get(&cell(key)).and_then(|c| c.as_number());
            assert!(before.is_some());
            assert_eq!(after, before, "{} changed on re-import", key);
        }
        assert_eq!(loaded.raw(&cell("A1")), "0.123456789012");
        assert_eq!(loaded.raw(&cell("A3")), "3.14159265358979");
    }

    #[test]
    fn test_styled_blank_cells_are_not_exported() {
        let mut sheet = Sheet::new();
        sheet.set(cell("A1"), Cell::new_empty().with_style(Some(Style::emphasis())));
        sheet.set_input(cell("A2"), "x");
        let bytes = export_to_buffer(&sheet).unwrap();
        assert!(!bytes.is_empty());

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.xlsx");
        std::fs::write(&path, bytes).unwrap();
        let loaded = import_workbook(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.raw(&cell("A2")), "x");
    }

    #[test]
    fn test_data_text() {
        assert_eq!(data_text(&Data::Empty), None);
        assert_eq!(data_text(&Data::String("  ".into())), None);
        assert_eq!(data_text(&Data::Float(3.0)).as_deref(), Some("3"));
        assert_eq!(data_text(&Data::Float(0.25)).as_deref(), Some("0.25"));
        assert_eq!(data_text(&Data::Float(1e-12)).as_deref(), Some("0.000000000001"));
        assert_eq!(data_text(&Data::Int(-7)).as_deref(), Some("-7"));
        assert_eq!(data_text(&Data::Bool(true)).as_deref(), Some("TRUE"));
    }

    #[test]
    fn test_import_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(import_workbook(&dir.path().join("missing.xlsx")).is_err());
    }
}
