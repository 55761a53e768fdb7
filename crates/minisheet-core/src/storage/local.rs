//! Local key/value persistence of the sheet.
//!
//! Each key is one file in the store directory. The sheet lives under
//! [`CELLS_KEY`] as a JSON object mapping cell keys to
//! `{"value": <string|number>, "style": {...}}`; a bare string or number is
//! accepted too. An empty sheet removes the key instead of writing `{}`.

use crate::document::{Sheet, parse_cell_key};
use crate::error::Result;
use log::{debug, info, warn};
use minisheet_engine::engine::{Cell, Style, format_number};
use serde_json::{Map, Value, json};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key the serialized cell map is stored under.
pub const CELLS_KEY: &str = "miniExcelCells_v2";
/// Key the condition panel text is stored under.
pub const CONDITION_KEY: &str = "conditionCode";

/// File-per-key string store.
#[derive(Clone, Debug)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Stored value, `None` when the key is absent.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Temp file first, then rename into place.
        let tmp = self.path(&format!("{}.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Serialize a sheet to its persisted JSON form.
pub fn sheet_to_json(sheet: &Sheet) -> Value {
    let mut map = Map::new();
    for cell_ref in sheet.sorted_refs() {
        let Some(cell) = sheet.get(&cell_ref) else {
            continue;
        };
        let mut record = Map::new();
        record.insert("value".to_string(), Value::String(cell.to_input_string()));
        if let Some(style) = &cell.style {
            record.insert("style".to_string(), json!(style));
        }
        map.insert(cell_ref.to_string(), Value::Object(record));
    }
    Value::Object(map)
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn cell_from_value(key: &str, value: &Value) -> Option<Cell> {
    let (raw, style) = match value {
        Value::Object(record) => {
            let raw = record.get("value").map(value_text).unwrap_or(Some(String::new()))?;
            let style = match record.get("style") {
                None | Some(Value::Null) => None,
                Some(style) => match serde_json::from_value::<Style>(style.clone()) {
                    Ok(style) => Some(style),
                    Err(e) => {
                        warn!("ignoring unreadable style for {}: {}", key, e);
                        None
                    }
                },
            };
            (raw, style)
        }
        other => (value_text(other)?, None),
    };
    Some(Cell::from_input(&raw).with_style(style))
}

/// Build a sheet from persisted JSON. Unreadable entries are skipped.
pub fn sheet_from_json(text: &str) -> Sheet {
    let mut sheet = Sheet::new();
    let map = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            warn!("persisted cells are not a JSON object; starting empty");
            return sheet;
        }
        Err(e) => {
            warn!("persisted cells are corrupt ({}); starting empty", e);
            return sheet;
        }
    };
    for (key, value) in &map {
        let cell_ref = match parse_cell_key(key) {
            Ok(cell_ref) => cell_ref,
            Err(e) => {
                warn!("skipping persisted cell: {}", e);
                continue;
            }
        };
        match cell_from_value(key, value) {
            Some(cell) => sheet.set(cell_ref, cell),
            None => warn!("skipping unreadable persisted value for {}", key),
        }
    }
    sheet
}

/// Load the sheet; absence or corruption yields an empty sheet.
pub fn load_sheet(store: &LocalStore) -> Sheet {
    match store.get(CELLS_KEY) {
        Ok(Some(text)) => {
            let sheet = sheet_from_json(&text);
            info!("hydrated {} cells from {}", sheet.len(), store.dir().display());
            sheet
        }
        Ok(None) => Sheet::new(),
        Err(e) => {
            warn!("could not read persisted cells: {}", e);
            Sheet::new()
        }
    }
}

/// Persist the sheet; an empty sheet removes the key.
pub fn save_sheet(store: &LocalStore, sheet: &Sheet) -> Result<()> {
    if sheet.is_empty() {
        debug!("sheet empty, removing {}", CELLS_KEY);
        return store.remove(CELLS_KEY);
    }
    let text = serde_json::to_string(&sheet_to_json(sheet))?;
    store.set(CELLS_KEY, &text)?;
    info!("flushed {} cells", sheet.len());
    Ok(())
}

pub fn load_condition(store: &LocalStore) -> String {
    store.get(CONDITION_KEY).ok().flatten().unwrap_or_default()
}

pub fn save_condition(store: &LocalStore, code: &str) -> Result<()> {
    store.set(CONDITION_KEY, code)
}
