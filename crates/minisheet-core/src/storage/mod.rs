//! Persistence and external collaborators: local store, debounce, workbook
//! files, remote endpoints.

mod debounce;
mod local;
mod remote;
mod workbook;

pub use debounce::DebouncedWriter;
pub use local::{
    CELLS_KEY, CONDITION_KEY, LocalStore, load_condition, load_sheet, save_condition, save_sheet,
    sheet_from_json, sheet_to_json,
};
pub use remote::RemoteClient;
pub use workbook::{export_to_buffer, export_workbook, import_workbook};
