// End-to-end properties of the ranking pipeline on fixture and synthetic data.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{json, Value};
use statline_engine::sanitize::sanitize_value;
use statline_engine::zscore::compute_pool_stats;
use statline_engine::{rank_players, PlayerKind, RankedTable, RawRow, ScoringProfile};

const FIXTURES: &str = "tests/fixtures";

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Read a stats CSV the way an upstream adapter would: every cell as text.
fn load_rows(file: &str) -> Vec<RawRow> {
    let path = Path::new(FIXTURES).join(file);
    let mut rdr = csv::Reader::from_path(path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    rdr.records()
        .map(|rec| {
            let rec = rec.unwrap();
            let mut fields: HashMap<String, Value> = HashMap::new();
            for (h, v) in headers.iter().zip(rec.iter()) {
                fields.insert(h.to_string(), Value::String(v.to_string()));
            }
            RawRow {
                name: rec[0].to_string(),
                team: rec[1].to_string(),
                fields,
            }
        })
        .collect()
}

fn pitcher(name: &str, ip: f64, era: f64) -> RawRow {
    RawRow::new(name, "NYM")
        .with("IP", ip)
        .with("W", 10)
        .with("ERA", era)
        .with("WHIP", 1.2)
        .with("SO", 150)
        .with("SV", 0)
        .with("HLD", 0)
}

fn scores_for(table: &RankedTable, column: &str) -> Vec<f64> {
    table
        .players
        .iter()
        .filter_map(|p| table.score(p, column))
        .collect()
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

#[test]
fn every_category_is_centered_with_unit_spread() {
    let table = rank_players(&load_rows("pitching_2025.csv"), &ScoringProfile::pitchers());
    for column in &table.columns {
        let scores = scores_for(&table, column);
        assert_eq!(scores.len(), table.len(), "{column} has missing scores");
        let stats = compute_pool_stats(&scores);
        assert!(approx_eq(stats.mean, 0.0, 1e-9), "{column} mean {}", stats.mean);
        assert!(approx_eq(stats.stdev, 1.0, 1e-9), "{column} stdev {}", stats.stdev);
    }
}

#[test]
fn zero_variance_category_contributes_nothing() {
    let rows = vec![pitcher("A", 100.0, 3.0), pitcher("B", 100.0, 4.0)];
    let table = rank_players(&rows, &ScoringProfile::pitchers());
    for column in ["W", "WHIP", "SO", "SV", "HLD"] {
        assert!(scores_for(&table, column).iter().all(|s| *s == 0.0));
    }
    assert!(table.players.iter().all(|p| p.total.is_finite()));
}

// ---------------------------------------------------------------------------
// Polarity and reweighting
// ---------------------------------------------------------------------------

#[test]
fn lowest_era_ranks_above_highest_era() {
    let rows = vec![
        pitcher("Six", 150.0, 6.0),
        pitcher("Two", 150.0, 2.0),
        pitcher("Four", 150.0, 4.0),
    ];
    let table = rank_players(&rows, &ScoringProfile::pitchers());
    let era = &table.stats[1];
    assert!(approx_eq(era.mean, 4.0, 1e-10));
    assert!(approx_eq(era.stdev, 1.633, 1e-3));

    let two = table.find("Two").unwrap();
    let six = table.find("Six").unwrap();
    assert!(two.total > six.total);
    assert!(two.rank < six.rank);
    assert_eq!(table.players[0].name, "Two");
}

#[test]
fn more_innings_earn_more_credit_for_the_same_good_era() {
    let rows = vec![
        pitcher("Ace Full", 180.0, 2.5),
        pitcher("Ace Partial", 30.0, 2.5),
        pitcher("Bad Full", 180.0, 5.5),
        pitcher("Bad Partial", 30.0, 5.5),
        pitcher("Average", 100.0, 4.0),
    ];
    let table = rank_players(&rows, &ScoringProfile::pitchers());
    let era = |name: &str| table.score(table.find(name).unwrap(), "ERA").unwrap();
    assert!(era("Ace Full") > era("Ace Partial"));
    assert!(era("Bad Full") < era("Bad Partial"));
}

// ---------------------------------------------------------------------------
// Qualification
// ---------------------------------------------------------------------------

#[test]
fn zero_innings_rows_never_appear() {
    let table = rank_players(&load_rows("pitching_2025.csv"), &ScoringProfile::pitchers());
    assert!(table.find("Injured Starter").is_none());
    assert_eq!(table.excluded, 1);
    assert_eq!(table.len(), 8);
}

#[test]
fn excluded_rows_do_not_move_anyone_else() {
    let base = vec![
        pitcher("A", 120.0, 3.1),
        pitcher("B", 80.0, 4.4),
        pitcher("C", 60.0, 5.0),
    ];
    let mut with_ghost = base.clone();
    with_ghost.insert(1, pitcher("Ghost", 0.0, 99.0).with("SO", 9999));

    let a = rank_players(&base, &ScoringProfile::pitchers());
    let b = rank_players(&with_ghost, &ScoringProfile::pitchers());
    assert!(b.find("Ghost").is_none());
    assert_eq!(a.players, b.players);
    assert_eq!(a.stats, b.stats);
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[test]
fn rank_increases_as_total_decreases() {
    let table = rank_players(&load_rows("pitching_2025.csv"), &ScoringProfile::pitchers());
    for pair in table.players.windows(2) {
        assert_eq!(pair[1].rank, pair[0].rank + 1);
        assert!(pair[0].total >= pair[1].total);
    }
    assert_eq!(table.players[0].rank, 1);
}

#[test]
fn identical_input_gives_identical_table() {
    let rows = load_rows("pitching_2025.csv");
    let first = rank_players(&rows, &ScoringProfile::pitchers());
    let second = rank_players(&rows, &ScoringProfile::pitchers());
    assert_eq!(first, second);
}

#[test]
fn formatted_cells_flow_through_ranking() {
    let table = rank_players(&load_rows("pitching_2025.csv"), &ScoringProfile::pitchers());
    let position_player = table.find("Position Player").unwrap();
    assert_eq!(position_player.raw[1], Some(27.0));
    assert_eq!(table.kind, PlayerKind::Pitcher);
}

// ---------------------------------------------------------------------------
// Sanitizer examples
// ---------------------------------------------------------------------------

#[test]
fn sanitizer_examples() {
    assert_eq!(sanitize_value(&json!("$3.50")), Some(3.50));
    assert_eq!(sanitize_value(&json!("N/A")), None);
    assert_eq!(sanitize_value(&json!(12)), Some(12.0));
}
