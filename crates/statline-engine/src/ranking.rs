// Composite scoring and rank ordering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::{PlayerKind, RawRow, ScoringProfile};
use crate::qualify::qualify;
use crate::reweight::reliability_scores;
use crate::sanitize::sanitize_rows;
use crate::zscore::{standardize, PoolStats};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Population statistics for one category of one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStatistics {
    pub column: String,
    pub mean: f64,
    pub stdev: f64,
    /// Second-pass stats of the weighted intermediate, for reliability-weighted
    /// categories only.
    pub reliability: Option<PoolStats>,
}

/// One ranked player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPlayer {
    /// 1-based position in the table.
    pub rank: usize,
    pub name: String,
    pub team: String,
    pub pos: Option<String>,
    /// Sanitized raw values, parallel to the table's columns.
    pub raw: Vec<Option<f64>>,
    pub volume: Option<f64>,
    /// Signed standard scores (positive is good), parallel to the table's columns.
    pub scores: Vec<Option<f64>>,
    pub total: f64,
}

/// A complete ranking for one kind of player, ordered by total descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    pub kind: PlayerKind,
    pub columns: Vec<String>,
    pub stats: Vec<CategoryStatistics>,
    pub players: Vec<RankedPlayer>,
    /// Rows dropped by the qualifier.
    pub excluded: usize,
}

impl RankedTable {
    pub fn empty(kind: PlayerKind) -> Self {
        RankedTable {
            kind,
            columns: ScoringProfile::for_kind(kind).columns(),
            stats: Vec::new(),
            players: Vec::new(),
            excluded: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The first `limit` players (or all of them if there are fewer).
    pub fn top(&self, limit: usize) -> &[RankedPlayer] {
        &self.players[..limit.min(self.players.len())]
    }

    /// Look up a player by name, ignoring case and surrounding whitespace.
    pub fn find(&self, name: &str) -> Option<&RankedPlayer> {
        let needle = name.trim();
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(needle))
    }

    /// All players on a team, in rank order.
    pub fn players_on_team(&self, team: &str) -> Vec<&RankedPlayer> {
        let needle = team.trim();
        self.players
            .iter()
            .filter(|p| p.team.eq_ignore_ascii_case(needle))
            .collect()
    }

    /// Distinct non-missing positions, sorted.
    pub fn positions(&self) -> Vec<String> {
        let mut out: Vec<String> = self.players.iter().filter_map(|p| p.pos.clone()).collect();
        out.sort();
        out.dedup();
        out
    }

    /// Distinct teams, sorted.
    pub fn teams(&self) -> Vec<String> {
        let mut out: Vec<String> = self.players.iter().map(|p| p.team.clone()).collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// A player's score for a named category.
    pub fn score(&self, player: &RankedPlayer, column: &str) -> Option<f64> {
        self.column_index(column)
            .and_then(|i| player.scores.get(i).copied().flatten())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Rank raw upstream rows under a scoring profile.
///
/// Runs sanitize, qualify, normalize, reweight and rank. Statistics are
/// computed over qualified rows only. Missing category cells contribute 0 to
/// the total. Equal totals keep upstream row order.
pub fn rank_players(rows: &[RawRow], profile: &ScoringProfile) -> RankedTable {
    let sanitized = sanitize_rows(rows, profile);
    let qualified = qualify(sanitized, profile);
    let records = qualified.records;

    let volumes: Vec<f64> = records.iter().map(|r| r.volume).collect();
    let mut stats = Vec::with_capacity(profile.categories.len());
    // scores[category][row]
    let mut scores: Vec<Vec<Option<f64>>> = Vec::with_capacity(profile.categories.len());

    for (c, category) in profile.categories.iter().enumerate() {
        let column: Vec<Option<f64>> = records.iter().map(|r| r.values[c]).collect();
        let (pool, reliability, plain) = if category.reliability_weighted {
            let out = reliability_scores(&column, &volumes);
            (out.raw, Some(out.intermediate), out.scores)
        } else {
            let (pool, plain) = standardize(&column);
            (pool, None, plain)
        };
        stats.push(CategoryStatistics {
            column: category.column.clone(),
            mean: pool.mean,
            stdev: pool.stdev,
            reliability,
        });
        scores.push(
            plain
                .into_iter()
                .map(|s| s.map(|z| category.polarity.orient(z)))
                .collect(),
        );
    }

    let mut players: Vec<RankedPlayer> = records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let row_scores: Vec<Option<f64>> = scores.iter().map(|col| col[i]).collect();
            let total = row_scores.iter().flatten().sum();
            RankedPlayer {
                rank: 0,
                name: record.name,
                team: record.team,
                pos: None,
                raw: record.values,
                volume: Some(record.volume),
                scores: row_scores,
                total,
            }
        })
        .collect();

    // sort_by is stable
    players.sort_by(|a, b| b.total.total_cmp(&a.total));
    for (i, player) in players.iter_mut().enumerate() {
        player.rank = i + 1;
    }

    debug!(
        "Ranked {} {}s ({} excluded)",
        players.len(),
        profile.kind,
        qualified.excluded
    );

    RankedTable {
        kind: profile.kind,
        columns: profile.columns(),
        stats,
        players,
        excluded: qualified.excluded,
    }
}
