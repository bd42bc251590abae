// Screen layout: panel arrangement and sizing.
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +-------------------------------+------------------+
// | Main Panel (70%)              | Detail (30%)     |
// +-------------------------------+------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each dashboard zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Tabs, evaluation window, last update and refresh status.
    pub status_bar: Rect,
    /// Ranked table, or a team's roster on the Teams tab.
    pub main_panel: Rect,
    /// Selected player's breakdown, or the team list on the Teams tab.
    pub detail: Rect,
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // main + detail
            Constraint::Length(1), // help bar
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(vertical[1]);

    AppLayout {
        status_bar: vertical[0],
        main_panel: horizontal[0],
        detail: horizontal[1],
        help_bar: vertical[2],
    }
}
