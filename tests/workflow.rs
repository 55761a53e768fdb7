//! End-to-end workflow through the core: edit, batch, sort, style, persist.

use minisheet_core::document::{GridGeometry, NavKey, SelectionEvent, SortOrder};
use minisheet_core::storage::{
    LocalStore, export_workbook, import_workbook, load_sheet, save_sheet,
};
use minisheet_core::{CellRef, Document, MinisheetError};
use minisheet_engine::engine::{Aggregate, FontWeight, StylePatch};
use tempfile::TempDir;

fn cell(key: &str) -> CellRef {
    CellRef::from_str(key).unwrap()
}

fn type_into(doc: &mut Document, key: &str, text: &str) {
    doc.handle(SelectionEvent::Click(cell(key)));
    doc.selection.set_buffer(text);
    doc.handle(SelectionEvent::Blur);
}

fn drag(doc: &mut Document, from: &str, to: &str) {
    doc.handle(SelectionEvent::Press(cell(from)));
    doc.handle(SelectionEvent::Hover(cell(to)));
    doc.handle(SelectionEvent::Release);
}

#[test]
fn test_column_entry_with_keyboard_then_sum() {
    let mut doc = Document::default();
    doc.handle(SelectionEvent::Click(cell("A1")));
    for value in ["10", "20", "30"] {
        doc.selection.set_buffer(value);
        doc.handle(SelectionEvent::Navigate(NavKey::Enter));
    }
    doc.handle(SelectionEvent::Escape);
    assert_eq!(doc.sheet.len(), 3);

    drag(&mut doc, "A1", "A3");
    let at = doc.run_batch(Aggregate::Sum).unwrap();
    assert_eq!(at, cell("A4"));
    assert_eq!(doc.display(&cell("A4")), "60");
    assert!(doc.sheet.style(&cell("A4")).unwrap().is_bold());
}

#[test]
fn test_row_batch_shifts_existing_cells_right() {
    let mut doc = Document::default();
    type_into(&mut doc, "A1", "2");
    type_into(&mut doc, "B1", "8");
    type_into(&mut doc, "C1", "keep");
    drag(&mut doc, "A1", "B1");
    let at = doc.run_batch(Aggregate::Average).unwrap();
    assert_eq!(at, cell("C1"));
    assert_eq!(doc.display(&cell("C1")), "5");
    assert_eq!(doc.sheet.raw(&cell("D1")), "keep");
}

#[test]
fn test_rectangle_is_rejected() {
    let mut doc = Document::default();
    type_into(&mut doc, "A1", "1");
    drag(&mut doc, "A1", "B2");
    assert!(matches!(
        doc.run_batch(Aggregate::Max),
        Err(MinisheetError::UnsupportedShape)
    ));
}

#[test]
fn test_formula_cells_follow_their_inputs() {
    let mut doc = Document::default();
    type_into(&mut doc, "A1", "3");
    type_into(&mut doc, "B1", "=A1*A1");
    assert_eq!(doc.display(&cell("B1")), "9");
    type_into(&mut doc, "A1", "4");
    assert_eq!(doc.display(&cell("B1")), "16");
}

#[test]
fn test_sort_then_persist_and_reload() {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::new(dir.path());

    let mut doc = Document::new(GridGeometry::default());
    type_into(&mut doc, "A1", "pear");
    type_into(&mut doc, "A2", "apple");
    type_into(&mut doc, "A3", "fig");
    drag(&mut doc, "A1", "A3");
    doc.apply_style(&StylePatch {
        font_weight: Some(FontWeight::Bold),
        ..StylePatch::default()
    });
    doc.sort(SortOrder::Descending).unwrap();
    save_sheet(&store, &doc.sheet).unwrap();

    let reloaded = Document::with_sheet(load_sheet(&store), GridGeometry::default());
    assert_eq!(reloaded.sheet.raw(&cell("A1")), "pear");
    assert_eq!(reloaded.sheet.raw(&cell("A2")), "fig");
    assert_eq!(reloaded.sheet.raw(&cell("A3")), "apple");
    assert!(reloaded.sheet.style(&cell("A3")).unwrap().is_bold());
}

#[test]
fn test_workbook_import_replaces_sheet() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.xlsx");

    let mut source = Document::default();
    type_into(&mut source, "B2", "7");
    type_into(&mut source, "C2", "hello");
    export_workbook(&source.sheet, &path).unwrap();

    let mut doc = Document::default();
    type_into(&mut doc, "A1", "stale");
    doc.replace_sheet(import_workbook(&path).unwrap());
    assert!(doc.sheet.get(&cell("A1")).is_none());
    assert_eq!(doc.sheet.raw(&cell("B2")), "7");
    assert_eq!(doc.sheet.raw(&cell("C2")), "hello");
    assert_eq!(
        doc.evaluate_condition("IF(B2>5) PRINT(\"big\") ELSE PRINT(\"small\")")
            .to_string(),
        "big"
    );
}
