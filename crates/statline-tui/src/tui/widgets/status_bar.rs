// Status bar widget: tab indicator, evaluation window, last update, refresh state.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::service::{RefreshState, SnapshotOrigin};
use crate::tui::{TabId, ViewState};

/// Layout: [tab bar] | [window] | [updated] | [refresh indicator]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = vec![Span::raw(" ")];
    spans.extend(tab_spans(state.active_tab));

    let sep = || Span::styled(" | ", Style::default().fg(Color::Gray));

    match state.snapshot.as_deref() {
        Some(snapshot) => {
            spans.push(sep());
            spans.push(Span::styled(
                snapshot.window.to_string(),
                Style::default().fg(Color::White),
            ));
            spans.push(sep());
            let origin = match snapshot.origin {
                SnapshotOrigin::Refresh => "",
                SnapshotOrigin::Artifact => " (saved)",
            };
            spans.push(Span::styled(
                format!(
                    "Updated {}{}",
                    snapshot.updated_at.format("%Y-%m-%d %H:%M"),
                    origin
                ),
                Style::default().fg(Color::White),
            ));
        }
        None => {
            spans.push(sep());
            spans.push(Span::styled("No data", Style::default().fg(Color::Yellow)));
        }
    }

    spans.push(sep());
    let (text, color) = refresh_indicator(&state.refresh);
    spans.push(Span::styled(text, Style::default().fg(color)));

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Short refresh status text and its colour.
pub fn refresh_indicator(refresh: &RefreshState) -> (String, Color) {
    match refresh {
        RefreshState::Idle => ("Idle".to_string(), Color::Gray),
        RefreshState::Running => ("Refreshing...".to_string(), Color::Yellow),
        RefreshState::Succeeded(summary) => (
            format!(
                "Refreshed {}P/{}H in {} ms",
                summary.pitchers, summary.hitters, summary.elapsed_ms
            ),
            Color::Green,
        ),
        RefreshState::Failed { message, at } => (
            format!("Refresh failed at {}: {}", at.format("%H:%M"), message),
            Color::Red,
        ),
    }
}

/// "[1:Pitchers] [2:Hitters] [3:Teams]" with the active tab highlighted.
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for (i, tab) in TabId::ALL.into_iter().enumerate() {
        let style = if tab == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}:{}]", i + 1, tab.label()), style));
        spans.push(Span::raw(" "));
    }
    spans
}
