// Ranking service: builds snapshots, publishes them, and answers queries.
//
// The current snapshot lives behind a `watch` channel. A refresh computes the
// new snapshot entirely in local scope and publishes it with one
// `send_replace`, so readers see either the old or the new snapshot and never
// wait on a recomputation. Refreshes are serialized by an async mutex.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use serde::Serialize;
use statline_engine::artifact::{load_ranked_table, save_ranked_table, ArtifactError};
use statline_engine::events::{aggregate_events, EventError, EventQuery, PlayerAverages};
use statline_engine::reconcile::{attach_positions, canonicalize_rows};
use statline_engine::{
    rank_players, AliasBook, JoinReport, PlayerKind, RankedPlayer, RankedTable, ScoringProfile,
};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::{Config, OutputConfig, PositionsConfig};
use crate::source::{load_positions, SourceError, StatsSource};
use crate::window::{check_season, EvaluationWindow, Timeframe, WindowError};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to fetch {kind} stats: {source}")]
    Fetch {
        kind: PlayerKind,
        #[source]
        source: SourceError,
    },

    #[error("upstream returned no {0} rows")]
    Empty(PlayerKind),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("data not loaded yet")]
    NotLoaded,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("error fetching data: {0}")]
    Upstream(#[from] SourceError),
}

impl From<WindowError> for QueryError {
    fn from(e: WindowError) -> Self {
        QueryError::InvalidParameter(e.to_string())
    }
}

impl From<EventError> for QueryError {
    fn from(e: EventError) -> Self {
        QueryError::InvalidParameter(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Snapshot and query results
// ---------------------------------------------------------------------------

/// How the published snapshot was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotOrigin {
    Refresh,
    Artifact,
}

/// One immutable, complete ranking state.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingSnapshot {
    pub pitchers: RankedTable,
    pub hitters: RankedTable,
    pub window: EvaluationWindow,
    pub updated_at: DateTime<Local>,
    pub origin: SnapshotOrigin,
}

impl RankingSnapshot {
    pub fn table(&self, kind: PlayerKind) -> &RankedTable {
        match kind {
            PlayerKind::Pitcher => &self.pitchers,
            PlayerKind::Hitter => &self.hitters,
        }
    }
}

/// Outcome of a successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub pitchers: usize,
    pub hitters: usize,
    pub excluded_pitchers: usize,
    pub excluded_hitters: usize,
    pub updated_at: DateTime<Local>,
    pub elapsed_ms: u128,
}

/// Progress of the most recent refresh, published alongside snapshots.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    Running,
    Succeeded(RefreshSummary),
    Failed {
        message: String,
        at: DateTime<Local>,
    },
}

/// The head of one ranked table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSlice {
    pub kind: PlayerKind,
    pub columns: Vec<String>,
    pub players: Vec<RankedPlayer>,
    pub updated_at: DateTime<Local>,
}

/// A single player with the columns needed to label their scores.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMatch {
    pub kind: PlayerKind,
    pub columns: Vec<String>,
    pub player: RankedPlayer,
}

/// Every ranked player on one team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamOverview {
    pub team: String,
    pub pitcher_columns: Vec<String>,
    pub pitchers: Vec<RankedPlayer>,
    pub hitter_columns: Vec<String>,
    pub hitters: Vec<RankedPlayer>,
}

/// Result of the per-event filtering query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub kind: PlayerKind,
    pub timeframe: Timeframe,
    pub columns: Vec<String>,
    pub players: Vec<PlayerAverages>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    pub loaded: bool,
    pub window: EvaluationWindow,
    pub updated_at: Option<DateTime<Local>>,
    pub origin: Option<SnapshotOrigin>,
    pub pitchers: usize,
    pub hitters: usize,
    pub source: String,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Settings the service needs from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub window: EvaluationWindow,
    pub min_ip: f64,
    pub min_pa: f64,
    pub default_limit: usize,
    pub filter_limit: usize,
    pub positions: PositionsConfig,
    pub output: OutputConfig,
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Self {
        ServiceSettings {
            window: config.window(),
            min_ip: config.ranking.min_ip,
            min_pa: config.ranking.min_pa,
            default_limit: config.ranking.default_limit,
            filter_limit: config.ranking.filter_limit,
            positions: config.positions.clone(),
            output: config.output.clone(),
        }
    }

    fn profile(&self, kind: PlayerKind) -> ScoringProfile {
        let threshold = match kind {
            PlayerKind::Pitcher => self.min_ip,
            PlayerKind::Hitter => self.min_pa,
        };
        ScoringProfile::for_kind(kind).with_threshold(threshold)
    }

    fn positions_path(&self, kind: PlayerKind) -> Option<&str> {
        match kind {
            PlayerKind::Pitcher => self.positions.pitchers.as_deref(),
            PlayerKind::Hitter => self.positions.hitters.as_deref(),
        }
    }

    fn output_path(&self, kind: PlayerKind) -> Option<&str> {
        match kind {
            PlayerKind::Pitcher => self.output.pitchers_csv.as_deref(),
            PlayerKind::Hitter => self.output.hitters_csv.as_deref(),
        }
    }
}

pub struct RankingService {
    source: Arc<dyn StatsSource>,
    settings: ServiceSettings,
    aliases: AliasBook,
    snapshot_tx: watch::Sender<Option<Arc<RankingSnapshot>>>,
    refresh_tx: watch::Sender<RefreshState>,
    refresh_lock: Mutex<()>,
}

impl RankingService {
    pub fn new(source: Arc<dyn StatsSource>, settings: ServiceSettings, aliases: AliasBook) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (refresh_tx, _) = watch::channel(RefreshState::Idle);
        RankingService {
            source,
            settings,
            aliases,
            snapshot_tx,
            refresh_tx,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &Config, source: Arc<dyn StatsSource>) -> Self {
        Self::new(source, ServiceSettings::from_config(config), config.aliases.clone())
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// The currently published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<RankingSnapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<RankingSnapshot>>> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_refresh(&self) -> watch::Receiver<RefreshState> {
        self.refresh_tx.subscribe()
    }

    fn loaded(&self) -> Result<Arc<RankingSnapshot>, QueryError> {
        self.snapshot().ok_or(QueryError::NotLoaded)
    }

    // -- Refresh ------------------------------------------------------------

    /// Recompute both tables and publish a new snapshot.
    ///
    /// On failure the previous snapshot stays published. Artifact write
    /// failures are logged and do not fail the refresh.
    pub async fn refresh(&self) -> Result<RefreshSummary, RefreshError> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_tx.send_replace(RefreshState::Running);
        let started = Instant::now();
        info!("Refresh started ({}, {})", self.settings.window, self.source.describe());

        let result = self.recompute().await;
        match result {
            Ok(snapshot) => {
                let summary = RefreshSummary {
                    pitchers: snapshot.pitchers.len(),
                    hitters: snapshot.hitters.len(),
                    excluded_pitchers: snapshot.pitchers.excluded,
                    excluded_hitters: snapshot.hitters.excluded,
                    updated_at: snapshot.updated_at,
                    elapsed_ms: started.elapsed().as_millis(),
                };
                let snapshot = Arc::new(snapshot);
                self.snapshot_tx.send_replace(Some(Arc::clone(&snapshot)));
                info!(
                    "Refresh published: {} pitchers, {} hitters in {} ms",
                    summary.pitchers, summary.hitters, summary.elapsed_ms
                );
                self.write_artifacts(&snapshot);
                self.refresh_tx
                    .send_replace(RefreshState::Succeeded(summary.clone()));
                Ok(summary)
            }
            Err(e) => {
                error!("Refresh failed: {}", e);
                self.refresh_tx.send_replace(RefreshState::Failed {
                    message: e.to_string(),
                    at: Local::now(),
                });
                Err(e)
            }
        }
    }

    async fn recompute(&self) -> Result<RankingSnapshot, RefreshError> {
        let window = self.settings.window;
        let pitchers = self.build_table(PlayerKind::Pitcher, window).await?;
        let hitters = self.build_table(PlayerKind::Hitter, window).await?;
        Ok(RankingSnapshot {
            pitchers,
            hitters,
            window,
            updated_at: Local::now(),
            origin: SnapshotOrigin::Refresh,
        })
    }

    async fn build_table(
        &self,
        kind: PlayerKind,
        window: EvaluationWindow,
    ) -> Result<RankedTable, RefreshError> {
        let mut rows = self
            .source
            .fetch_stats(kind, window)
            .await
            .map_err(|source| RefreshError::Fetch { kind, source })?;
        if rows.is_empty() {
            return Err(RefreshError::Empty(kind));
        }

        let aliases = self.aliases.for_kind(kind);
        let renamed = canonicalize_rows(&mut rows, &aliases.stats);
        debug!("{} {} rows renamed by aliases", renamed, kind);

        let mut table = rank_players(&rows, &self.settings.profile(kind));

        if let Some(path) = self.settings.positions_path(kind) {
            let entries = load_positions(Path::new(path));
            let JoinReport { matched, unmatched } =
                attach_positions(&mut table, &entries, &aliases.positions);
            debug!("{} positions: {} matched, {} unmatched", kind, matched, unmatched);
        }
        Ok(table)
    }

    fn write_artifacts(&self, snapshot: &RankingSnapshot) {
        for kind in [PlayerKind::Pitcher, PlayerKind::Hitter] {
            let Some(path) = self.settings.output_path(kind) else {
                continue;
            };
            match save_ranked_table(Path::new(path), snapshot.table(kind)) {
                Ok(()) => debug!("Wrote {} rankings to {}", kind, path),
                Err(e) => warn!("Failed to write {} rankings to {}: {}", kind, path, e),
            }
        }
    }

    /// Publish tables from previously written artifacts, if both exist and
    /// nothing has been published yet. Returns whether a snapshot was seeded.
    pub fn seed_from_artifacts(&self) -> Result<bool, ArtifactError> {
        let (Some(p_path), Some(h_path)) = (
            self.settings.output_path(PlayerKind::Pitcher),
            self.settings.output_path(PlayerKind::Hitter),
        ) else {
            return Ok(false);
        };
        let (p_path, h_path) = (Path::new(p_path), Path::new(h_path));
        if !p_path.exists() || !h_path.exists() || self.snapshot().is_some() {
            return Ok(false);
        }

        let pitchers = load_ranked_table(p_path, PlayerKind::Pitcher)?;
        let hitters = load_ranked_table(h_path, PlayerKind::Hitter)?;
        let updated_at = std::fs::metadata(p_path)
            .and_then(|m| m.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());

        info!(
            "Seeded {} pitchers and {} hitters from saved rankings",
            pitchers.len(),
            hitters.len()
        );
        self.snapshot_tx.send_replace(Some(Arc::new(RankingSnapshot {
            pitchers,
            hitters,
            window: self.settings.window,
            updated_at,
            origin: SnapshotOrigin::Artifact,
        })));
        Ok(true)
    }

    // -- Queries ------------------------------------------------------------

    fn slice(&self, kind: PlayerKind, limit: Option<usize>) -> Result<TableSlice, QueryError> {
        let limit = limit.unwrap_or(self.settings.default_limit);
        if limit == 0 {
            return Err(QueryError::InvalidParameter("limit must be > 0".into()));
        }
        let snapshot = self.loaded()?;
        let table = snapshot.table(kind);
        Ok(TableSlice {
            kind,
            columns: table.columns.clone(),
            players: table.top(limit).to_vec(),
            updated_at: snapshot.updated_at,
        })
    }

    pub fn ranked_pitchers(&self, limit: Option<usize>) -> Result<TableSlice, QueryError> {
        self.slice(PlayerKind::Pitcher, limit)
    }

    pub fn ranked_hitters(&self, limit: Option<usize>) -> Result<TableSlice, QueryError> {
        self.slice(PlayerKind::Hitter, limit)
    }

    /// Look a player up in the pitcher table first, then the hitter table.
    pub fn player(&self, name: &str) -> Result<PlayerMatch, QueryError> {
        let snapshot = self.loaded()?;
        for kind in [PlayerKind::Pitcher, PlayerKind::Hitter] {
            let table = snapshot.table(kind);
            if let Some(player) = table.find(name) {
                return Ok(PlayerMatch {
                    kind,
                    columns: table.columns.clone(),
                    player: player.clone(),
                });
            }
        }
        Err(QueryError::NotFound(format!("player '{}'", name.trim())))
    }

    pub fn team(&self, team: &str) -> Result<TeamOverview, QueryError> {
        let snapshot = self.loaded()?;
        let pitchers: Vec<RankedPlayer> = snapshot
            .pitchers
            .players_on_team(team)
            .into_iter()
            .cloned()
            .collect();
        let hitters: Vec<RankedPlayer> = snapshot
            .hitters
            .players_on_team(team)
            .into_iter()
            .cloned()
            .collect();
        if pitchers.is_empty() && hitters.is_empty() {
            return Err(QueryError::NotFound(format!("team '{}'", team.trim())));
        }
        Ok(TeamOverview {
            team: team.trim().to_uppercase(),
            pitcher_columns: snapshot.pitchers.columns.clone(),
            pitchers,
            hitter_columns: snapshot.hitters.columns.clone(),
            hitters,
        })
    }

    /// Average per-event columns per player over a recent timeframe.
    ///
    /// Independent of the published snapshot. `season`, when given, must be
    /// a tracked season; the date range always comes from `timeframe`.
    pub async fn filter_stats(
        &self,
        season: Option<i32>,
        timeframe: &str,
        player_type: &str,
    ) -> Result<FilterResult, QueryError> {
        if let Some(season) = season {
            check_season(season)?;
        }
        let timeframe: Timeframe = timeframe.parse()?;
        let kind: PlayerKind = player_type
            .parse()
            .map_err(|_| QueryError::InvalidParameter(format!("invalid type '{player_type}'; use 'pitcher' or 'hitter'")))?;

        let rows = self.source.fetch_events(kind, timeframe).await?;
        let query = EventQuery::for_kind(kind, self.settings.filter_limit);
        let players = aggregate_events(&rows, &query)?;
        debug!(
            "filter_stats {} {}: {} events -> {} players",
            kind,
            timeframe,
            rows.len(),
            players.len()
        );
        Ok(FilterResult {
            kind,
            timeframe,
            columns: query.columns,
            players,
        })
    }

    pub fn status(&self) -> ServiceStatus {
        let snapshot = self.snapshot();
        ServiceStatus {
            loaded: snapshot.is_some(),
            window: self.settings.window,
            updated_at: snapshot.as_ref().map(|s| s.updated_at),
            origin: snapshot.as_ref().map(|s| s.origin),
            pitchers: snapshot.as_ref().map_or(0, |s| s.pitchers.len()),
            hitters: snapshot.as_ref().map_or(0, |s| s.hitters.len()),
            source: self.source.describe(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
