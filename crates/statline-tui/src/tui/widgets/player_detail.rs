// Player detail widget: per-category breakdown for the selected player.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use statline_engine::{RankedPlayer, ScoringProfile};

use super::rankings::{format_raw, format_score};
use crate::tui::tier::{score_style, ScoreTier};
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Player");
    let (Some(table), Some(player)) = (state.active_table(), state.selected_player()) else {
        frame.render_widget(Paragraph::new("No player selected").block(block), area);
        return;
    };
    let volume_column = ScoringProfile::for_kind(table.kind).volume_column;
    let lines = detail_lines(player, &table.columns, &volume_column);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Header lines followed by one line per category: column, raw, score, tier.
pub fn detail_lines(
    player: &RankedPlayer,
    columns: &[String],
    volume_column: &str,
) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::Gray);

    let mut lines = vec![
        Line::from(Span::styled(player.name.clone(), bold)),
        Line::from(format!(
            "#{} | {} | {}",
            player.rank,
            player.team,
            player.pos.as_deref().unwrap_or("--")
        )),
        Line::from(vec![
            Span::raw("Total "),
            Span::styled(
                format!("{:+.2}", player.total),
                score_style(Some(player.total)),
            ),
            Span::styled(
                format!("  {} {}", volume_column, format_raw(player.volume)),
                dim,
            ),
        ]),
        Line::from(""),
    ];

    for (i, column) in columns.iter().enumerate() {
        let raw = player.raw.get(i).copied().flatten();
        let score = player.scores.get(i).copied().flatten();
        let tier = ScoreTier::for_score(score).map_or("", ScoreTier::label);
        lines.push(Line::from(vec![
            Span::styled(format!("{:<5}", column), bold),
            Span::raw(format!("{:>7} ", format_raw(raw))),
            Span::styled(format!("{:>6}", format_score(score)), score_style(score)),
            Span::styled(format!(" {}", tier), dim),
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::tests::{buffer_text, loaded_state};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn lines_cover_every_category() {
        let player = RankedPlayer {
            rank: 4,
            name: "Juan Soto".into(),
            team: "NYM".into(),
            pos: Some("OF".into()),
            raw: vec![Some(38.0), None],
            volume: Some(660.0),
            scores: vec![Some(1.7), None],
            total: 1.7,
        };
        let lines = detail_lines(&player, &["HR".into(), "AVG".into()], "PA");
        assert_eq!(lines.len(), 6);
        assert_eq!(line_text(&lines[1]), "#4 | NYM | OF");
        assert!(line_text(&lines[2]).contains("PA 660"));
        let hr = line_text(&lines[4]);
        assert!(hr.starts_with("HR"));
        assert!(hr.contains("+1.70"));
        assert!(hr.contains("Strong"));
        assert!(line_text(&lines[5]).contains("--"));
    }

    #[test]
    fn render_selected_player() {
        let mut terminal = Terminal::new(TestBackend::new(40, 16)).unwrap();
        let state = loaded_state();
        let expected = state.selected_player().unwrap().name.clone();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        assert!(buffer_text(&terminal).contains(&expected));
    }

    #[test]
    fn render_without_snapshot() {
        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        let state = ViewState::default();
        terminal
            .draw(|frame| render(frame, frame.area(), &state))
            .unwrap();
        assert!(buffer_text(&terminal).contains("No player selected"));
    }
}
