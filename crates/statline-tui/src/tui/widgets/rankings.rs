// Rankings widget: the ranked table for the active tab.
//
// Columns: Rank, Name, Team, Pos, one per category, Total. Category cells
// show the signed score coloured by tier, or the raw stat when the raw view
// is toggled on. Filtered by position_filter and filter_text.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;
use statline_engine::RankedPlayer;

use crate::tui::tier::score_style;
use crate::tui::ViewState;

/// Render the ranked table for the active tab.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let Some(table) = state.active_table() else {
        let waiting = Paragraph::new("Waiting for first refresh...")
            .block(Block::default().borders(Borders::ALL).title("Rankings"));
        frame.render_widget(waiting, area);
        return;
    };

    let visible = state.visible_players();

    let mut header_cells = vec![
        Cell::from("#"),
        Cell::from("Name"),
        Cell::from("Team"),
        Cell::from("Pos"),
    ];
    header_cells.extend(table.columns.iter().map(|c| Cell::from(c.clone())));
    header_cells.push(Cell::from("Total"));
    let header = Row::new(header_cells).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = visible
        .iter()
        .map(|p| player_row(p, &table.columns, state.show_raw))
        .collect();

    let mut widths = vec![
        Constraint::Length(4),
        Constraint::Min(18),
        Constraint::Length(5),
        Constraint::Length(5),
    ];
    widths.extend(table.columns.iter().map(|_| Constraint::Length(7)));
    widths.push(Constraint::Length(7));

    let title = build_title(state, visible.len());
    let widget = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut table_state = TableState::default().with_selected(state.selection(visible.len()));
    frame.render_stateful_widget(widget, area, &mut table_state);
}

fn player_row(player: &RankedPlayer, columns: &[String], show_raw: bool) -> Row<'static> {
    let mut cells = vec![
        Cell::from(player.rank.to_string()),
        Cell::from(player.name.clone()),
        Cell::from(player.team.clone()),
        Cell::from(player.pos.clone().unwrap_or_else(|| "--".to_string())),
    ];
    for i in 0..columns.len() {
        let score = player.scores.get(i).copied().flatten();
        if show_raw {
            let raw = player.raw.get(i).copied().flatten();
            cells.push(Cell::from(format_raw(raw)));
        } else {
            cells.push(Cell::from(format_score(score)).style(score_style(score)));
        }
    }
    cells.push(Cell::from(format!("{:+.2}", player.total)).style(score_style(Some(player.total))));
    Row::new(cells)
}

/// Filter players by position and case-insensitive name substring.
pub fn filter_players<'a>(
    players: &'a [RankedPlayer],
    position_filter: Option<&str>,
    filter_text: &str,
) -> Vec<&'a RankedPlayer> {
    let text_lower = filter_text.to_lowercase();
    players
        .iter()
        .filter(|p| match position_filter {
            Some(pos) => p.pos.as_deref() == Some(pos),
            None => true,
        })
        .filter(|p| text_lower.is_empty() || p.name.to_lowercase().contains(&text_lower))
        .collect()
}

pub fn format_score(score: Option<f64>) -> String {
    match score {
        Some(s) if s.is_finite() => format!("{:+.2}", s),
        _ => "--".to_string(),
    }
}

/// Raw stats: rates below 1 get three decimals (.287), whole counts none.
pub fn format_raw(value: Option<f64>) -> String {
    match value {
        None => "--".to_string(),
        Some(v) if v.fract() == 0.0 => format!("{:.0}", v),
        Some(v) if v.abs() < 1.0 => format!("{:.3}", v).replacen("0.", ".", 1),
        Some(v) => format!("{:.2}", v),
    }
}

fn build_title(state: &ViewState, count: usize) -> Line<'static> {
    let mut title = state.active_tab.label().to_string();
    if state.show_raw {
        title.push_str(" (raw)");
    }
    if let Some(ref pos) = state.position_filter {
        title.push_str(&format!(" [{}]", pos));
    }
    if !state.filter_text.is_empty() {
        title.push_str(&format!(" \"{}\"", state.filter_text));
    }
    title.push_str(&format!(" ({})", count));
    Line::from(title)
}
