use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use minisheet_core::document::{NavKey, SelectionEvent};
use ratatui::prelude::*;
use std::io;
use std::time::Instant;

use super::app::{App, Mode};
use super::ui;

/// Handle text editing operations on a buffer with UTF-8 aware cursor movement.
fn handle_text_input(buffer: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Left => {
            if *cursor > 0 {
                let mut new_pos = *cursor - 1;
                while new_pos > 0 && !buffer.is_char_boundary(new_pos) {
                    new_pos -= 1;
                }
                *cursor = new_pos;
            }
        }
        KeyCode::Right => {
            if *cursor < buffer.len() {
                let mut new_pos = *cursor + 1;
                while new_pos < buffer.len() && !buffer.is_char_boundary(new_pos) {
                    new_pos += 1;
                }
                *cursor = new_pos;
            }
        }
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = buffer.len(),
        KeyCode::Backspace => {
            if *cursor > 0 {
                let mut del_start = *cursor - 1;
                while del_start > 0 && !buffer.is_char_boundary(del_start) {
                    del_start -= 1;
                }
                buffer.drain(del_start..*cursor);
                *cursor = del_start;
            }
        }
        KeyCode::Delete => {
            if *cursor < buffer.len() {
                let mut del_end = *cursor + 1;
                while del_end < buffer.len() && !buffer.is_char_boundary(del_end) {
                    del_end += 1;
                }
                buffer.drain(*cursor..del_end);
            }
        }
        KeyCode::Char(c) => {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                buffer.insert(*cursor, c);
                *cursor += c.len_utf8();
            }
        }
        _ => {}
    }
}

fn nav_key(code: KeyCode) -> Option<NavKey> {
    match code {
        KeyCode::Up => Some(NavKey::Up),
        KeyCode::Down => Some(NavKey::Down),
        KeyCode::Left => Some(NavKey::Left),
        KeyCode::Right => Some(NavKey::Right),
        KeyCode::Enter => Some(NavKey::Enter),
        KeyCode::Tab => Some(NavKey::Tab),
        _ => None,
    }
}

/// Returns true when the app should quit.
fn handle_command_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc => {
            app.mode = Mode::Grid;
            app.command_buffer.clear();
            app.command_cursor = 0;
            false
        }
        KeyCode::Enter => app.execute_command(),
        _ => {
            handle_text_input(&mut app.command_buffer, &mut app.command_cursor, key);
            false
        }
    }
}

fn handle_edit_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.doc.handle(SelectionEvent::Escape);
        }
        KeyCode::Backspace => app.doc.selection.backspace(),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.doc.selection.push_char(c);
        }
        code => {
            if let Some(nav) = nav_key(code) {
                app.doc.handle(SelectionEvent::Navigate(nav));
            }
        }
    }
}

fn handle_grid_key(app: &mut App, key: KeyEvent) {
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Char(':') => {
            app.mode = Mode::Command;
            app.command_buffer.clear();
            app.command_cursor = 0;
            app.status_message.clear();
        }
        KeyCode::Esc => {
            app.doc.handle(SelectionEvent::Escape);
            app.status_message.clear();
        }
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right if shift => {
            if let Some(nav) = nav_key(key.code) {
                app.doc.handle(SelectionEvent::Extend(nav));
            }
        }
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            // Typing over a cell replaces its content.
            app.doc.handle(SelectionEvent::Navigate(NavKey::Enter));
            app.doc.selection.set_buffer("");
            app.doc.selection.push_char(c);
        }
        code => {
            if let Some(nav) = nav_key(code) {
                app.doc.handle(SelectionEvent::Navigate(nav));
            }
        }
    }
}

fn handle_mouse_event(app: &mut App, terminal_area: Rect, mouse: MouseEvent) {
    if app.mode != Mode::Grid {
        return;
    }
    let [_formula_area, grid_area, _condition_area, _status_area] =
        ui::split_main_chunks(terminal_area);
    let target = ui::grid_cell_at(app, grid_area, mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => match target {
            Some(cell) => {
                app.drag_origin = Some(cell.clone());
                app.doc.handle(SelectionEvent::Press(cell));
            }
            None => {
                app.drag_origin = None;
                app.doc.handle(SelectionEvent::DismissOutside);
            }
        },
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(cell) = target {
                app.doc.handle(SelectionEvent::Hover(cell));
            }
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.doc.handle(SelectionEvent::Release);
            // Press and release on the same cell is a click.
            if let Some(origin) = app.drag_origin.take()
                && target.as_ref() == Some(&origin)
            {
                app.doc.handle(SelectionEvent::Click(origin));
            }
        }
        MouseEventKind::ScrollDown => app.scroll_by(3, 0),
        MouseEventKind::ScrollUp => app.scroll_by(-3, 0),
        MouseEventKind::ScrollRight => app.scroll_by(0, 1),
        MouseEventKind::ScrollLeft => app.scroll_by(0, -1),
        _ => {}
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let now = Instant::now();
        if event::poll(app.poll_timeout(now))? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process key press events (Windows reports Press + Release)
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }
                    match app.mode {
                        Mode::Command => {
                            if handle_command_key(app, key) {
                                return Ok(());
                            }
                        }
                        Mode::Grid if app.doc.selection.is_editing() => handle_edit_key(app, key),
                        Mode::Grid => handle_grid_key(app, key),
                    }
                    app.scroll_to_cursor();
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    handle_mouse_event(app, Rect::new(0, 0, size.width, size.height), mouse);
                }
                Event::FocusLost => {
                    app.doc.handle(SelectionEvent::Blur);
                }
                _ => {}
            }
        }

        let now = Instant::now();
        app.note_changes(now);
        app.tick(now);
    }
}
