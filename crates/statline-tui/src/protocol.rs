// Message types: JSON requests/responses for the query server and the
// channel messages between the orchestrator and the TUI.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statline_engine::events::PlayerAverages;
use statline_engine::{PlayerKind, RankedPlayer};

use crate::service::{
    FilterResult, PlayerMatch, QueryError, RankingSnapshot, RefreshError, RefreshState,
    RefreshSummary, ServiceStatus, TableSlice, TeamOverview,
};
use crate::window::Timeframe;

// ---------------------------------------------------------------------------
// Query server: requests
// ---------------------------------------------------------------------------

/// One request frame from a query client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetPitchers {
        #[serde(default)]
        limit: Option<usize>,
    },
    GetHitters {
        #[serde(default)]
        limit: Option<usize>,
    },
    GetPlayer {
        name: String,
    },
    GetTeam {
        team: String,
    },
    Refresh,
    FilterStats {
        #[serde(default)]
        season: Option<i32>,
        timeframe: String,
        player_type: String,
    },
    Status,
}

// ---------------------------------------------------------------------------
// Query server: responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotLoaded,
    NotFound,
    InvalidParameter,
    RefreshFailed,
    UpstreamError,
    BadRequest,
}

/// A category column with the player's raw value and signed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryView {
    pub column: String,
    pub raw: Option<f64>,
    pub score: Option<f64>,
}

/// A ranked player as sent over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub rank: usize,
    pub name: String,
    pub team: String,
    pub pos: Option<String>,
    pub total_score: f64,
    pub categories: Vec<CategoryView>,
}

impl PlayerView {
    pub fn new(player: &RankedPlayer, columns: &[String]) -> Self {
        PlayerView {
            rank: player.rank,
            name: player.name.clone(),
            team: player.team.clone(),
            pos: player.pos.clone(),
            total_score: player.total,
            categories: columns
                .iter()
                .enumerate()
                .map(|(i, column)| CategoryView {
                    column: column.clone(),
                    raw: player.raw.get(i).copied().flatten(),
                    score: player.scores.get(i).copied().flatten(),
                })
                .collect(),
        }
    }

    fn list(players: &[RankedPlayer], columns: &[String]) -> Vec<PlayerView> {
        players.iter().map(|p| PlayerView::new(p, columns)).collect()
    }
}

/// One response frame. Every request gets exactly one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    Rankings {
        player_type: PlayerKind,
        updated_at: String,
        players: Vec<PlayerView>,
    },
    Player {
        player_type: PlayerKind,
        player: PlayerView,
    },
    Team {
        team: String,
        pitchers: Vec<PlayerView>,
        hitters: Vec<PlayerView>,
    },
    Refreshed {
        summary: RefreshSummary,
    },
    FilterStats {
        player_type: PlayerKind,
        timeframe: Timeframe,
        columns: Vec<String>,
        players: Vec<PlayerAverages>,
    },
    Status {
        status: ServiceStatus,
    },
    Error {
        code: ErrorCode,
        message: String,
    },
}

impl Response {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error {
            code,
            message: message.into(),
        }
    }
}

impl From<TableSlice> for Response {
    fn from(slice: TableSlice) -> Self {
        Response::Rankings {
            player_type: slice.kind,
            updated_at: slice.updated_at.to_rfc3339(),
            players: PlayerView::list(&slice.players, &slice.columns),
        }
    }
}

impl From<PlayerMatch> for Response {
    fn from(m: PlayerMatch) -> Self {
        Response::Player {
            player_type: m.kind,
            player: PlayerView::new(&m.player, &m.columns),
        }
    }
}

impl From<TeamOverview> for Response {
    fn from(t: TeamOverview) -> Self {
        Response::Team {
            pitchers: PlayerView::list(&t.pitchers, &t.pitcher_columns),
            hitters: PlayerView::list(&t.hitters, &t.hitter_columns),
            team: t.team,
        }
    }
}

impl From<FilterResult> for Response {
    fn from(r: FilterResult) -> Self {
        Response::FilterStats {
            player_type: r.kind,
            timeframe: r.timeframe,
            columns: r.columns,
            players: r.players,
        }
    }
}

impl From<QueryError> for Response {
    fn from(e: QueryError) -> Self {
        let code = match &e {
            QueryError::NotLoaded => ErrorCode::NotLoaded,
            QueryError::NotFound(_) => ErrorCode::NotFound,
            QueryError::InvalidParameter(_) => ErrorCode::InvalidParameter,
            QueryError::Upstream(_) => ErrorCode::UpstreamError,
        };
        Response::error(code, e.to_string())
    }
}

impl From<RefreshError> for Response {
    fn from(e: RefreshError) -> Self {
        Response::error(ErrorCode::RefreshFailed, e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Orchestrator <-> TUI
// ---------------------------------------------------------------------------

/// State pushed from the orchestrator to the TUI.
#[derive(Debug, Clone)]
pub enum UiUpdate {
    /// A newly published snapshot.
    Snapshot(Arc<RankingSnapshot>),
    Refresh(RefreshState),
}

/// Commands from the TUI to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Refresh,
    Quit,
}
