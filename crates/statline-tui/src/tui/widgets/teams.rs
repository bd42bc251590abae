// Teams widget: team list beside the selected team's ranked players.

use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table};
use ratatui::Frame;
use statline_engine::{PlayerKind, RankedPlayer};

use crate::tui::tier::score_style;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, main: Rect, sidebar: Rect, state: &ViewState) {
    let teams = state.teams();
    let selected = state.selection(teams.len());

    let items: Vec<ListItem> = teams.iter().map(|t| ListItem::new(t.clone())).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Teams"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut list_state = ListState::default().with_selected(selected);
    frame.render_stateful_widget(list, sidebar, &mut list_state);

    let Some(team) = selected.and_then(|i| teams.get(i)) else {
        let waiting = Paragraph::new("Waiting for first refresh...")
            .block(Block::default().borders(Borders::ALL).title("Roster"));
        frame.render_widget(waiting, main);
        return;
    };

    let roster = team_roster(state, team);
    let header = Row::new(vec!["Type", "#", "Name", "Pos", "Total"]).style(
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = roster
        .iter()
        .map(|(kind, p)| {
            Row::new(vec![
                Cell::from(kind_tag(*kind)),
                Cell::from(p.rank.to_string()),
                Cell::from(p.name.clone()),
                Cell::from(p.pos.clone().unwrap_or_else(|| "--".to_string())),
                Cell::from(format!("{:+.2}", p.total)).style(score_style(Some(p.total))),
            ])
        })
        .collect();
    let widths = [
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Min(18),
        Constraint::Length(5),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("{} ({} players)", team, roster.len())),
    );
    frame.render_widget(table, main);
}

/// Pitchers then hitters on `team`, each in rank order.
pub fn team_roster<'a>(state: &'a ViewState, team: &str) -> Vec<(PlayerKind, &'a RankedPlayer)> {
    let Some(snapshot) = state.snapshot.as_deref() else {
        return Vec::new();
    };
    [PlayerKind::Pitcher, PlayerKind::Hitter]
        .into_iter()
        .flat_map(|kind| {
            snapshot
                .table(kind)
                .players_on_team(team)
                .into_iter()
                .map(move |p| (kind, p))
        })
        .collect()
}

fn kind_tag(kind: PlayerKind) -> &'static str {
    match kind {
        PlayerKind::Pitcher => "P",
        PlayerKind::Hitter => "H",
    }
}
