// Ranking engine: sanitize, qualify, standardize, reweight, rank, reconcile.
//
// Everything here is synchronous and in-memory. Fetching and scheduling live
// in the service crate.

pub mod artifact;
pub mod category;
pub mod events;
pub mod qualify;
pub mod ranking;
pub mod reconcile;
pub mod reweight;
pub mod sanitize;
pub mod zscore;

pub use category::{Category, PlayerKind, Polarity, RawRow, ScoringProfile};
pub use ranking::{rank_players, CategoryStatistics, RankedPlayer, RankedTable};
pub use reconcile::{AliasBook, AliasMap, JoinReport, PositionEntry};
