// TUI widget modules for each dashboard panel.

pub mod player_detail;
pub mod rankings;
pub mod status_bar;
pub mod teams;
