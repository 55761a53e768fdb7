//! UI rendering

use super::app::{App, Mode};
use minisheet_core::CellRef;
use minisheet_engine::engine::{ERROR_MARKER, TextAlign};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

pub(crate) const FORMULA_BAR_HEIGHT: u16 = 3;
pub(crate) const GRID_MIN_HEIGHT: u16 = 6;
pub(crate) const CONDITION_BAR_HEIGHT: u16 = 1;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const ROW_HEADER_WIDTH: u16 = 6;
pub(crate) const GRID_COLUMN_SPACING: u16 = 1;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FORMULA_BAR_HEIGHT),
            Constraint::Min(GRID_MIN_HEIGHT),
            Constraint::Length(CONDITION_BAR_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Grid cell under a mouse position, if any.
pub(crate) fn grid_cell_at(
    app: &App,
    grid_area: Rect,
    mouse_col: u16,
    mouse_row: u16,
) -> Option<CellRef> {
    let inner_x = grid_area.x.saturating_add(1);
    let inner_y = grid_area.y.saturating_add(1);
    let inner_right = grid_area.x.saturating_add(grid_area.width.saturating_sub(1));
    let inner_bottom = grid_area.y.saturating_add(grid_area.height.saturating_sub(1));
    if mouse_col < inner_x || mouse_col >= inner_right || mouse_row >= inner_bottom {
        return None;
    }
    // Header row holds column letters.
    let data_top = inner_y.saturating_add(1);
    if mouse_row < data_top {
        return None;
    }
    let cells_left = inner_x + ROW_HEADER_WIDTH + GRID_COLUMN_SPACING;
    if mouse_col < cells_left {
        return None;
    }

    let rows = app.rows_on_screen();
    let cols = app.cols_on_screen();
    let row = *rows.get((mouse_row - data_top) as usize)?;
    let stride = app.col_width() + GRID_COLUMN_SPACING;
    let col = *cols.get(((mouse_col - cells_left) / stride) as usize)?;
    Some(CellRef::new(col, row))
}

/// Draw the application UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = split_main_chunks(f.area());

    let grid_area = chunks[1];
    let available_width = grid_area
        .width
        .saturating_sub(2 + ROW_HEADER_WIDTH + GRID_COLUMN_SPACING) as usize;
    let available_height = grid_area.height.saturating_sub(3) as usize; // header + borders
    let stride = (app.col_width() + GRID_COLUMN_SPACING) as usize;
    app.set_visible(available_height, available_width / stride);

    draw_formula_bar(f, app, chunks[0]);
    draw_grid(f, app, chunks[1]);
    draw_condition_bar(f, app, chunks[2]);
    draw_status_bar(f, app, chunks[3]);
}

fn draw_formula_bar(f: &mut Frame, app: &App, area: Rect) {
    let selection = &app.doc.selection;
    let cursor = selection.cursor();

    let (title, content, color) = if let Some(editing) = selection.editing() {
        (" Edit ", format!("{}: {}│", editing, selection.buffer()), Color::Yellow)
    } else {
        let name = match selection.selection() {
            [] | [_] => cursor.to_string(),
            cells => format!("{} ({} cells)", cursor, cells.len()),
        };
        let raw = app.doc.sheet.raw(cursor);
        let content = if raw.is_empty() {
            format!("{}: (empty)", name)
        } else {
            format!("{}: {}", name, raw)
        };
        (" Cell ", content, Color::White)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    f.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_grid(f: &mut Frame, app: &App, area: Rect) {
    let rows_on_screen = app.rows_on_screen();
    let cols_on_screen = app.cols_on_screen();
    let selection = &app.doc.selection;
    let cursor = selection.cursor();
    let editing = selection.editing();
    let highlight = selection.highlight();
    let evaluator = app.doc.sheet.evaluator();

    let header_style = |active: bool| {
        if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let mut header_cells = vec![Cell::from(" ")];
    for &col in &cols_on_screen {
        let name = CellRef::col_to_letters(col);
        header_cells.push(Cell::from(name).style(header_style(col == cursor.col)));
    }
    let header = Row::new(header_cells).height(1);

    let mut rows = Vec::with_capacity(rows_on_screen.len());
    for &row in &rows_on_screen {
        let mut cells = Vec::with_capacity(cols_on_screen.len() + 1);
        cells.push(Cell::from(format!("{}", row + 1)).style(header_style(row == cursor.row)));

        for &col in &cols_on_screen {
            let cell_ref = CellRef::new(col, row);
            let is_editing = editing == Some(&cell_ref);
            let display = if is_editing {
                format!("{}│", selection.buffer())
            } else {
                app.doc.sheet.display_with(&evaluator, &cell_ref)
            };

            let cell_style = app.doc.sheet.style(&cell_ref);
            let alignment = match cell_style.map(|s| s.text_align) {
                Some(TextAlign::Center) => Alignment::Center,
                Some(TextAlign::Right) => Alignment::Right,
                _ => Alignment::Left,
            };

            let mut style = if is_editing {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else if cell_ref == *cursor {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else if selection.is_selected(&cell_ref) {
                Style::default().fg(Color::White).bg(Color::Blue)
            } else if highlight == Some(&cell_ref) {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else if display == ERROR_MARKER {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            if cell_style.is_some_and(|s| s.is_bold()) {
                style = style.add_modifier(Modifier::BOLD);
            }

            cells.push(Cell::from(Line::from(display).alignment(alignment)).style(style));
        }
        rows.push(Row::new(cells));
    }

    let mut widths = vec![Constraint::Length(ROW_HEADER_WIDTH)];
    widths.extend(cols_on_screen.iter().map(|_| Constraint::Length(app.col_width())));

    let title = format!(
        " Minisheet  {}x{} ",
        app.doc.viewport.num_rows(),
        app.doc.viewport.num_cols()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(GRID_COLUMN_SPACING);

    f.render_widget(table, area);
}

fn draw_condition_bar(f: &mut Frame, app: &App, area: Rect) {
    let code = if app.doc.condition_code.is_empty() {
        "(none, use :cond)".to_string()
    } else {
        app.doc.condition_code.clone()
    };
    let result = app.condition_result.as_deref().unwrap_or("");
    let result_style = if result.starts_with(ERROR_MARKER) {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    let line = Line::from(vec![
        Span::styled("Condition: ", Style::default().fg(Color::DarkGray)),
        Span::raw(code),
        Span::styled("  Result: ", Style::default().fg(Color::DarkGray)),
        Span::styled(result.to_string(), result_style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    if app.mode == Mode::Command {
        let (before, after) = app.command_buffer.split_at(app.command_cursor);
        let line = Line::from(Span::styled(
            format!(":{}│{}", before, after),
            Style::default().fg(Color::Cyan),
        ));
        f.render_widget(Paragraph::new(line), area);
        return;
    }

    let status = if app.status_message.is_empty() {
        let busy = if app.is_busy() { "  |  remote..." } else { "" };
        format!(
            "drag/shift+arrows: select  enter: edit  :sum :avg :sort :bold :cond :w :e :q{}",
            busy
        )
    } else {
        app.status_message.clone()
    };

    let style = if app.status_message.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else if !app.status_message.is_empty() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(Paragraph::new(Line::from(Span::styled(status, style))), area);
}
