// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages for the app
// orchestrator, or into local ViewState mutations (tabs, selection,
// filtering, view toggles).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{TabId, ViewState};
use crate::protocol::UserCommand;

/// Rows moved by PageUp/PageDown.
const PAGE_SIZE: usize = 20;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // crossterm emits Press and Release on some platforms.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.filter_mode {
        handle_filter_mode(key_event, view_state);
        return None;
    }

    match key_event.code {
        KeyCode::Char('1') => switch_tab(view_state, TabId::Pitchers),
        KeyCode::Char('2') => switch_tab(view_state, TabId::Hitters),
        KeyCode::Char('3') => switch_tab(view_state, TabId::Teams),
        KeyCode::Tab => {
            let next = match view_state.active_tab {
                TabId::Pitchers => TabId::Hitters,
                TabId::Hitters => TabId::Teams,
                TabId::Teams => TabId::Pitchers,
            };
            switch_tab(view_state, next);
        }

        KeyCode::Up | KeyCode::Char('k') => move_selection_up(view_state, 1),
        KeyCode::Down | KeyCode::Char('j') => move_selection_down(view_state, 1),
        KeyCode::PageUp => move_selection_up(view_state, PAGE_SIZE),
        KeyCode::PageDown => move_selection_down(view_state, PAGE_SIZE),
        KeyCode::Home | KeyCode::Char('g') => {
            view_state.selected.insert(view_state.active_tab, 0);
        }

        KeyCode::Char('z') => view_state.show_raw = !view_state.show_raw,

        KeyCode::Char('/') => {
            if view_state.active_tab.kind().is_some() {
                view_state.filter_mode = true;
            }
        }
        KeyCode::Char('p') => cycle_position_filter(view_state),
        KeyCode::Esc => {
            view_state.filter_text.clear();
            view_state.position_filter = None;
            reset_selection(view_state);
        }

        KeyCode::Char('r') => return Some(UserCommand::Refresh),
        KeyCode::Char('q') => return Some(UserCommand::Quit),

        _ => {}
    }
    None
}

/// While filtering, printable characters edit the name filter; Enter keeps
/// it and Esc clears it.
fn handle_filter_mode(key_event: KeyEvent, view_state: &mut ViewState) {
    match key_event.code {
        KeyCode::Esc => {
            view_state.filter_mode = false;
            view_state.filter_text.clear();
        }
        KeyCode::Enter => {
            view_state.filter_mode = false;
        }
        KeyCode::Backspace => {
            view_state.filter_text.pop();
        }
        KeyCode::Char(c) => {
            view_state.filter_text.push(c);
        }
        _ => return,
    }
    reset_selection(view_state);
}

fn switch_tab(view_state: &mut ViewState, tab: TabId) {
    if view_state.active_tab != tab {
        view_state.active_tab = tab;
        // Positions differ between pitchers and hitters.
        view_state.position_filter = None;
    }
}

fn reset_selection(view_state: &mut ViewState) {
    view_state.selected.insert(view_state.active_tab, 0);
}

/// Number of selectable rows on the active tab.
fn row_count(view_state: &ViewState) -> usize {
    match view_state.active_tab {
        TabId::Teams => view_state.teams().len(),
        _ => view_state.visible_players().len(),
    }
}

fn move_selection_up(view_state: &mut ViewState, rows: usize) {
    let current = view_state.selection(row_count(view_state)).unwrap_or(0);
    view_state
        .selected
        .insert(view_state.active_tab, current.saturating_sub(rows));
}

fn move_selection_down(view_state: &mut ViewState, rows: usize) {
    let count = row_count(view_state);
    let current = view_state.selection(count).unwrap_or(0);
    let next = current.saturating_add(rows).min(count.saturating_sub(1));
    view_state.selected.insert(view_state.active_tab, next);
}

/// Cycle through the positions present in the active table.
///
/// None -> first position -> ... -> last position -> None
fn cycle_position_filter(view_state: &mut ViewState) {
    let Some(table) = view_state.active_table() else {
        return;
    };
    let positions = table.positions();
    view_state.position_filter = match &view_state.position_filter {
        None => positions.first().cloned(),
        Some(current) => match positions.iter().position(|p| p == current) {
            Some(i) if i + 1 < positions.len() => Some(positions[i + 1].clone()),
            _ => None,
        },
    };
    reset_selection(view_state);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
