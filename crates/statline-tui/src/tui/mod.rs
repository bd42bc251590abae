// TUI dashboard: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` holding the latest published snapshot and
// refresh state. The app orchestrator pushes `UiUpdate` messages over an mpsc
// channel; the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod tier;
pub mod widgets;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use statline_engine::{PlayerKind, RankedPlayer, RankedTable};
use tokio::sync::mpsc;

use crate::protocol::{UiUpdate, UserCommand};
use crate::service::{RankingSnapshot, RefreshState};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabId {
    Pitchers,
    Hitters,
    Teams,
}

impl TabId {
    pub const ALL: [TabId; 3] = [TabId::Pitchers, TabId::Hitters, TabId::Teams];

    /// The ranked table a tab shows, if it shows one.
    pub fn kind(self) -> Option<PlayerKind> {
        match self {
            TabId::Pitchers => Some(PlayerKind::Pitcher),
            TabId::Hitters => Some(PlayerKind::Hitter),
            TabId::Teams => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TabId::Pitchers => "Pitchers",
            TabId::Hitters => "Hitters",
            TabId::Teams => "Teams",
        }
    }
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state for rendering.
pub struct ViewState {
    pub snapshot: Option<Arc<RankingSnapshot>>,
    pub refresh: RefreshState,
    pub active_tab: TabId,
    /// Show raw stat values instead of standard scores.
    pub show_raw: bool,
    /// Selected row per tab. On the Teams tab this indexes the team list.
    pub selected: HashMap<TabId, usize>,
    pub filter_text: String,
    pub filter_mode: bool,
    pub position_filter: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            snapshot: None,
            refresh: RefreshState::Idle,
            active_tab: TabId::Pitchers,
            show_raw: false,
            selected: HashMap::new(),
            filter_text: String::new(),
            filter_mode: false,
            position_filter: None,
        }
    }
}

impl ViewState {
    /// The ranked table behind the active tab.
    pub fn active_table(&self) -> Option<&RankedTable> {
        let kind = self.active_tab.kind()?;
        self.snapshot.as_deref().map(|s| s.table(kind))
    }

    /// Players of the active table that pass the position and name filters.
    pub fn visible_players(&self) -> Vec<&RankedPlayer> {
        match self.active_table() {
            Some(table) => widgets::rankings::filter_players(
                &table.players,
                self.position_filter.as_deref(),
                &self.filter_text,
            ),
            None => Vec::new(),
        }
    }

    /// Distinct teams across both tables, sorted.
    pub fn teams(&self) -> Vec<String> {
        let Some(snapshot) = self.snapshot.as_deref() else {
            return Vec::new();
        };
        let mut teams = snapshot.pitchers.teams();
        teams.extend(snapshot.hitters.teams());
        teams.sort();
        teams.dedup();
        teams
    }

    /// Selected index on the active tab, clamped to `len`.
    pub fn selection(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let raw = self.selected.get(&self.active_tab).copied().unwrap_or(0);
        Some(raw.min(len - 1))
    }

    pub fn selected_player(&self) -> Option<&RankedPlayer> {
        let visible = self.visible_players();
        let index = self.selection(visible.len())?;
        visible.get(index).copied()
    }

    pub fn selected_team(&self) -> Option<String> {
        let teams = self.teams();
        let index = self.selection(teams.len())?;
        teams.into_iter().nth(index)
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
pub fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.snapshot = Some(snapshot);
        }
        UiUpdate::Refresh(refresh) => {
            state.refresh = refresh;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete dashboard frame.
pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    match state.active_tab {
        TabId::Pitchers | TabId::Hitters => {
            widgets::rankings::render(frame, layout.main_panel, state);
            widgets::player_detail::render(frame, layout.detail, state);
        }
        TabId::Teams => {
            widgets::teams::render(frame, layout.main_panel, layout.detail, state);
        }
    }
    render_help_bar(frame, &layout, state);
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = if state.filter_mode {
        format!(" Filter: {}_ | Enter:Apply | Esc:Clear", state.filter_text)
    } else {
        " q:Quit | 1-3:Tabs | j/k:Move | z:Scores/Raw | p:Position | /:Filter | r:Refresh"
            .to_string()
    };
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// This is the main entry point for the terminal UI. It:
/// 1. Initializes the terminal (enters raw mode, enables alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();

    // 2. Restore the terminal before the default panic output.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState::default();
    let mut event_stream = EventStream::new();

    // 3. ~30fps render tick
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => apply_ui_update(&mut view_state, ui_update),
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = cmd == UserCommand::Quit;
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse and resize events: the next tick redraws.
                    }
                    Some(Err(_)) | None => break,
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 4. Restore terminal
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
