//! minisheet-core - UI-agnostic grid state + storage.

pub mod document;
pub mod error;
pub mod storage;

pub use document::Document;
pub use error::{MinisheetError, Result};

pub use minisheet_engine::engine::CellRef;
