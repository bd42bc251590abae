// Minimum-usage qualifier applied before any population statistics.

use tracing::debug;

use crate::category::ScoringProfile;
use crate::sanitize::SanitizedRow;

/// A row that passed the qualifier. Usage volume is guaranteed present and
/// strictly above the profile threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub volume: f64,
    pub values: Vec<Option<f64>>,
}

/// Result of qualifying a sanitized table.
#[derive(Debug, Clone, PartialEq)]
pub struct Qualified {
    /// Kept rows, in input order.
    pub records: Vec<PlayerRecord>,
    pub excluded: usize,
}

/// Keep only rows whose usage volume strictly exceeds the profile threshold.
///
/// Rows with a missing volume are excluded along with the low-usage ones;
/// neither kind is zeroed or otherwise kept in the population.
pub fn qualify(rows: Vec<SanitizedRow>, profile: &ScoringProfile) -> Qualified {
    let total = rows.len();
    let records: Vec<PlayerRecord> = rows
        .into_iter()
        .filter_map(|row| match row.volume {
            Some(volume) if volume > profile.qualify_threshold => Some(PlayerRecord {
                name: row.name,
                team: row.team,
                volume,
                values: row.values,
            }),
            _ => None,
        })
        .collect();
    let excluded = total - records.len();

    debug!(
        "Qualifier ({}): kept {} of {} rows ({} > {})",
        profile.kind,
        records.len(),
        total,
        profile.volume_column,
        profile.qualify_threshold
    );

    Qualified { records, excluded }
}
