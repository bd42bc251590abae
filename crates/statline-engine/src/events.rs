// Per-player averages over raw per-event rows (pitch or batted-ball level).

use std::collections::HashMap;

use serde::Serialize;

use crate::category::{PlayerKind, RawRow};
use crate::sanitize::sanitize_value;

/// Which columns to average and how to order the result.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub columns: Vec<String>,
    /// Must be one of `columns`.
    pub sort_column: String,
    pub limit: usize,
}

impl EventQuery {
    /// Release speed, spin rate and whiff, ordered by release speed.
    pub fn pitchers(limit: usize) -> Self {
        EventQuery {
            columns: vec![
                "release_speed".into(),
                "release_spin_rate".into(),
                "whiff".into(),
            ],
            sort_column: "release_speed".into(),
            limit,
        }
    }

    /// Exit velocity, launch angle and BABIP, ordered by exit velocity.
    pub fn hitters(limit: usize) -> Self {
        EventQuery {
            columns: vec!["launch_speed".into(), "launch_angle".into(), "babip".into()],
            sort_column: "launch_speed".into(),
            limit,
        }
    }

    pub fn for_kind(kind: PlayerKind, limit: usize) -> Self {
        match kind {
            PlayerKind::Pitcher => Self::pitchers(limit),
            PlayerKind::Hitter => Self::hitters(limit),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EventError {
    #[error("sort column {sort_column} is not one of the averaged columns {columns:?}")]
    UnknownSortColumn {
        sort_column: String,
        columns: Vec<String>,
    },
}

/// Column averages for one player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAverages {
    pub name: String,
    /// Number of complete events averaged.
    pub events: usize,
    /// Parallel to the query's columns.
    pub averages: Vec<f64>,
}

/// Average each selected column per player.
///
/// Rows missing any selected column are dropped first. Players appear in
/// first-appearance order before the stable descending sort on the sort
/// column, then the result is cut to `limit`.
pub fn aggregate_events(
    rows: &[RawRow],
    query: &EventQuery,
) -> Result<Vec<PlayerAverages>, EventError> {
    let sort_idx = query
        .columns
        .iter()
        .position(|c| *c == query.sort_column)
        .ok_or_else(|| EventError::UnknownSortColumn {
            sort_column: query.sort_column.clone(),
            columns: query.columns.clone(),
        })?;

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut sums: Vec<(String, usize, Vec<f64>)> = Vec::new();

    for row in rows {
        let values: Option<Vec<f64>> = query
            .columns
            .iter()
            .map(|c| row.get(c).and_then(sanitize_value))
            .collect();
        let Some(values) = values else { continue };

        let slot = *index.entry(row.name.as_str()).or_insert_with(|| {
            sums.push((row.name.clone(), 0, vec![0.0; query.columns.len()]));
            sums.len() - 1
        });
        let (_, count, totals) = &mut sums[slot];
        *count += 1;
        for (t, v) in totals.iter_mut().zip(values) {
            *t += v;
        }
    }

    let mut out: Vec<PlayerAverages> = sums
        .into_iter()
        .map(|(name, events, totals)| PlayerAverages {
            name,
            events,
            averages: totals.into_iter().map(|t| t / events as f64).collect(),
        })
        .collect();

    out.sort_by(|a, b| b.averages[sort_idx].total_cmp(&a.averages[sort_idx]));
    out.truncate(query.limit);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn pitch(name: &str, speed: f64, spin: f64, whiff: f64) -> RawRow {
        RawRow::new(name, "")
            .with("release_speed", speed)
            .with("release_spin_rate", spin)
            .with("whiff", whiff)
            .with("pitch_type", "FF")
    }

    #[test]
    fn averages_grouped_by_player() {
        let rows = vec![
            pitch("Skenes, Paul", 99.0, 2400.0, 1.0),
            pitch("Skenes, Paul", 97.0, 2200.0, 0.0),
            pitch("Webb, Logan", 92.0, 2100.0, 0.0),
        ];
        let out = aggregate_events(&rows, &EventQuery::pitchers(50)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].name, "Skenes, Paul");
        assert_eq!(out[0].events, 2);
        assert!(approx_eq(out[0].averages[0], 98.0, 1e-10));
        assert!(approx_eq(out[0].averages[1], 2300.0, 1e-10));
        assert!(approx_eq(out[0].averages[2], 0.5, 1e-10));
    }

    #[test]
    fn incomplete_rows_are_dropped_before_averaging() {
        let rows = vec![
            pitch("A", 90.0, 2000.0, 0.0),
            RawRow::new("A", "")
                .with("release_speed", 80.0)
                .with("release_spin_rate", serde_json::Value::Null)
                .with("whiff", 1.0),
        ];
        let out = aggregate_events(&rows, &EventQuery::pitchers(50)).unwrap();
        assert_eq!(out[0].events, 1);
        assert!(approx_eq(out[0].averages[0], 90.0, 1e-10));
    }

    #[test]
    fn sorted_descending_and_truncated() {
        let rows = vec![
            pitch("Slow", 88.0, 2000.0, 0.0),
            pitch("Fast", 100.0, 2000.0, 0.0),
            pitch("Mid", 94.0, 2000.0, 0.0),
        ];
        let out = aggregate_events(&rows, &EventQuery::pitchers(2)).unwrap();
        let names: Vec<&str> = out.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Fast", "Mid"]);
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let rows = vec![pitch("B", 95.0, 1.0, 0.0), pitch("A", 95.0, 1.0, 0.0)];
        let out = aggregate_events(&rows, &EventQuery::pitchers(50)).unwrap();
        assert_eq!(out[0].name, "B");
        assert_eq!(out[1].name, "A");
    }

    #[test]
    fn sort_column_outside_columns_is_rejected() {
        let rows = vec![pitch("Fast", 100.0, 2000.0, 0.0)];
        let query = EventQuery {
            sort_column: "pitch_type".into(),
            ..EventQuery::pitchers(10)
        };
        let err = aggregate_events(&rows, &query).unwrap_err();
        assert_eq!(
            err,
            EventError::UnknownSortColumn {
                sort_column: "pitch_type".into(),
                columns: query.columns.clone(),
            }
        );
    }

    #[test]
    fn non_leading_sort_column_orders_result() {
        let rows = vec![
            pitch("Low Spin", 100.0, 2000.0, 0.0),
            pitch("High Spin", 90.0, 2600.0, 0.0),
        ];
        let query = EventQuery {
            sort_column: "release_spin_rate".into(),
            ..EventQuery::pitchers(10)
        };
        let out = aggregate_events(&rows, &query).unwrap();
        assert_eq!(out[0].name, "High Spin");
    }

    #[test]
    fn hitter_query_columns() {
        let q = EventQuery::for_kind(PlayerKind::Hitter, 10);
        assert_eq!(q.sort_column, "launch_speed");
        assert_eq!(q.columns.len(), 3);
    }
}
