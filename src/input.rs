//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  In browse mode keys are
//! commands; in the composer, username prompt and search box they edit the
//! input buffer.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_browse_key`] that calls it.
//! 3. Update the help text in `ui::draw_status_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Mode};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit = true;
        return;
    }

    if app.mode == Mode::Browse {
        handle_browse_key(app, key.code);
    } else {
        handle_edit_key(app, key.code);
    }
}

fn handle_browse_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::PageDown => app.scroll_page(true),
        KeyCode::PageUp => app.scroll_page(false),
        KeyCode::Char('n') => app.accept_banner(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('c') => app.compose(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('p') => app.open_selected_profile(),
        KeyCode::Char('h') => app.go_home(),
        _ => {}
    }
}

fn handle_edit_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => app.submit_input(),
        KeyCode::Backspace => {
            if let Some(buf) = app.input_buffer() {
                buf.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(buf) = app.input_buffer() {
                buf.push(c);
            }
        }
        _ => {}
    }
}
