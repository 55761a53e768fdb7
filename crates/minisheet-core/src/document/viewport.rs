//! Viewport windowing over an unbounded grid.
//!
//! Only the rows and columns around the scroll position are rendered. The
//! logical row/column counts grow geometrically (x1.5) as the user scrolls
//! towards them, so navigating right or down never runs out of grid.

use log::debug;
use std::ops::RangeInclusive;

/// Fixed geometry of the grid surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    pub row_height: f64,
    pub col_width: f64,
    /// Extra cells rendered around the visible area.
    pub buffer: usize,
    pub initial_rows: usize,
    pub initial_cols: usize,
}

impl Default for GridGeometry {
    fn default() -> Self {
        GridGeometry {
            row_height: 30.0,
            col_width: 100.0,
            buffer: 5,
            initial_rows: 200,
            initial_cols: 60,
        }
    }
}

/// Scroll offset and size of the scrollable surface, in the geometry's units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

/// First row/column to render (1-based) and how many are visible.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub start_row: usize,
    pub start_col: usize,
    pub visible_rows: usize,
    pub visible_cols: usize,
}

/// Tracks the viewport and the logical grid size.
#[derive(Clone, Debug)]
pub struct ViewportWindower {
    geometry: GridGeometry,
    num_rows: usize,
    num_cols: usize,
    viewport: Viewport,
}

/// Grown size: `max(ceil(current * 1.5), need)`.
fn grow(current: usize, need: usize) -> usize {
    let scaled = current.saturating_mul(3).div_ceil(2);
    scaled.max(need)
}

/// Cells covering `extent` units, at least one.
fn cells_covering(extent: f64, cell_size: f64) -> usize {
    if cell_size <= 0.0 || !extent.is_finite() || extent <= 0.0 {
        return 1;
    }
    ((extent / cell_size).ceil() as usize).max(1)
}

/// 1-based index of the cell containing `offset`.
fn first_cell(offset: f64, cell_size: f64) -> usize {
    if cell_size <= 0.0 || !offset.is_finite() || offset <= 0.0 {
        return 1;
    }
    ((offset / cell_size).floor() as usize).saturating_add(1)
}

impl ViewportWindower {
    pub fn new(geometry: GridGeometry) -> Self {
        let viewport = Viewport {
            start_row: 1,
            start_col: 1,
            visible_rows: 1,
            visible_cols: 1,
        };
        ViewportWindower {
            num_rows: geometry.initial_rows.max(1),
            num_cols: geometry.initial_cols.max(1),
            geometry,
            viewport,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Recompute the viewport for a scroll event and grow the grid if needed.
    pub fn on_scroll(&mut self, scroll: ScrollState) -> Viewport {
        let g = self.geometry;
        let first_row = first_cell(scroll.scroll_y, g.row_height);
        let first_col = first_cell(scroll.scroll_x, g.col_width);
        let visible_rows = cells_covering(scroll.height, g.row_height).saturating_add(g.buffer);
        let visible_cols = cells_covering(scroll.width, g.col_width).saturating_add(g.buffer);

        self.viewport = Viewport {
            start_row: first_row.saturating_sub(g.buffer).max(1),
            start_col: first_col.saturating_sub(g.buffer).max(1),
            visible_rows,
            visible_cols,
        };

        let need_rows = first_row.saturating_add(visible_rows).saturating_add(g.buffer);
        if need_rows > self.num_rows {
            let grown = grow(self.num_rows, need_rows);
            debug!("growing rows {} -> {}", self.num_rows, grown);
            self.num_rows = grown;
        }
        let need_cols = first_col.saturating_add(visible_cols).saturating_add(g.buffer);
        if need_cols > self.num_cols {
            let grown = grow(self.num_cols, need_cols);
            debug!("growing columns {} -> {}", self.num_cols, grown);
            self.num_cols = grown;
        }

        self.viewport
    }

    /// Grow the logical size so that 1-based (`row`, `col`) is inside it.
    pub fn ensure_contains(&mut self, row: usize, col: usize) {
        if row > self.num_rows {
            self.num_rows = grow(self.num_rows, row);
        }
        if col > self.num_cols {
            self.num_cols = grow(self.num_cols, col);
        }
    }

    /// 1-based rows to render.
    pub fn render_rows(&self) -> RangeInclusive<usize> {
        let start = self.viewport.start_row;
        let span = self.viewport.visible_rows.saturating_add(self.geometry.buffer);
        let end = self.num_rows.min(start.saturating_add(span));
        start..=end.max(start)
    }

    /// 1-based columns to render.
    pub fn render_cols(&self) -> RangeInclusive<usize> {
        let start = self.viewport.start_col;
        let span = self.viewport.visible_cols.saturating_add(self.geometry.buffer);
        let end = self.num_cols.min(start.saturating_add(span));
        start..=end.max(start)
    }
}

impl Default for ViewportWindower {
    fn default() -> Self {
        Self::new(GridGeometry::default())
    }
}
