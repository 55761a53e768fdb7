//! Document state and logic (UI-agnostic).

mod batch;
mod sheet;
mod selection;
mod sort;
mod state;
mod viewport;

pub use batch::{Axis, BatchPlan, classify, collect_values};
pub use selection::{Mode, NavKey, SelectionEvent, SelectionState, rectangle};
pub use sheet::{Sheet, parse_cell_key};
pub use sort::{SortOrder, sort_selection, sort_values};
pub use state::Document;
pub use viewport::{GridGeometry, ScrollState, Viewport, ViewportWindower};
