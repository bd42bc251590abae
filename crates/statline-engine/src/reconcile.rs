// Identity reconciliation: alias rewriting and the position left join.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::category::{PlayerKind, RawRow};
use crate::ranking::RankedTable;

// ---------------------------------------------------------------------------
// Alias tables
// ---------------------------------------------------------------------------

/// A roster-movement correction: `name` listed under `team` really belongs to
/// `canonical_team`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamOverride {
    pub name: String,
    pub team: String,
    pub canonical_team: String,
}

/// Declarative key corrections for one side of a join.
///
/// Applied in a fixed order: overrides match the raw (name, team) key, then
/// team abbreviations are mapped, then player names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasMap {
    pub teams: HashMap<String, String>,
    pub names: HashMap<String, String>,
    pub overrides: Vec<TeamOverride>,
}

impl AliasMap {
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty() && self.names.is_empty() && self.overrides.is_empty()
    }

    /// Canonical (name, team) for a raw key.
    pub fn canonical_key(&self, name: &str, team: &str) -> (String, String) {
        let mut team = self
            .overrides
            .iter()
            .find(|o| o.name == name && o.team == team)
            .map(|o| o.canonical_team.clone())
            .unwrap_or_else(|| team.to_string());
        if let Some(mapped) = self.teams.get(&team) {
            team = mapped.clone();
        }
        let name = self
            .names
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string());
        (name, team)
    }
}

/// Alias maps for the stats side and the metadata side of one player kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindAliases {
    pub stats: AliasMap,
    pub positions: AliasMap,
}

/// Every alias table the service knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasBook {
    pub pitchers: KindAliases,
    pub hitters: KindAliases,
}

impl AliasBook {
    pub fn for_kind(&self, kind: PlayerKind) -> &KindAliases {
        match kind {
            PlayerKind::Pitcher => &self.pitchers,
            PlayerKind::Hitter => &self.hitters,
        }
    }
}

// ---------------------------------------------------------------------------
// Rewriting and joining
// ---------------------------------------------------------------------------

/// Rewrite the identity of stats rows in place. Returns how many changed.
pub fn canonicalize_rows(rows: &mut [RawRow], aliases: &AliasMap) -> usize {
    if aliases.is_empty() {
        return 0;
    }
    let mut changed = 0;
    for row in rows.iter_mut() {
        let (name, team) = aliases.canonical_key(&row.name, &row.team);
        if name != row.name || team != row.team {
            debug!("Alias: ({}, {}) -> ({}, {})", row.name, row.team, name, team);
            row.name = name;
            row.team = team;
            changed += 1;
        }
    }
    changed
}

/// One row of a position table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionEntry {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "Pos", alias = "ESPN", default)]
    pub pos: Option<String>,
}

/// Outcome of a position join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JoinReport {
    pub matched: usize,
    pub unmatched: usize,
}

/// Left-join positions onto a ranked table on (name, team).
///
/// Entry keys are rewritten through `aliases` first. When two entries share a
/// key the first one wins. Players without a match stay in the table with
/// `pos = None`.
pub fn attach_positions(
    table: &mut RankedTable,
    entries: &[PositionEntry],
    aliases: &AliasMap,
) -> JoinReport {
    let mut lookup: HashMap<(String, String), Option<String>> = HashMap::new();
    for entry in entries {
        let key = aliases.canonical_key(&entry.name, &entry.team);
        let pos = entry
            .pos
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        lookup.entry(key).or_insert(pos);
    }

    let mut report = JoinReport::default();
    for player in table.players.iter_mut() {
        match lookup.get(&(player.name.clone(), player.team.clone())) {
            Some(pos) => {
                player.pos = pos.clone();
                report.matched += 1;
            }
            None => {
                player.pos = None;
                report.unmatched += 1;
                debug!("No position entry for {} ({})", player.name, player.team);
            }
        }
    }

    if report.unmatched > 0 && !entries.is_empty() {
        warn!(
            "Position join ({}): {} matched, {} unmatched",
            table.kind, report.matched, report.unmatched
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ScoringProfile;
    use crate::ranking::rank_players;

    fn pitcher_aliases() -> AliasMap {
        AliasMap {
            teams: HashMap::from([
                ("WSH".to_string(), "WSN".to_string()),
                ("TB".to_string(), "TBR".to_string()),
            ]),
            names: HashMap::from([("Louis Varland".to_string(), "Louie Varland".to_string())]),
            overrides: vec![TeamOverride {
                name: "Carl Edwards Jr.".into(),
                team: "FA".into(),
                canonical_team: "CHC".into(),
            }],
        }
    }

    fn entry(name: &str, team: &str, pos: &str) -> PositionEntry {
        PositionEntry {
            name: name.into(),
            team: team.into(),
            pos: Some(pos.into()),
        }
    }

    #[test]
    fn canonical_key_applies_override_then_team_then_name() {
        let aliases = pitcher_aliases();
        assert_eq!(
            aliases.canonical_key("Carl Edwards Jr.", "FA"),
            ("Carl Edwards Jr.".to_string(), "CHC".to_string())
        );
        assert_eq!(
            aliases.canonical_key("Louis Varland", "WSH"),
            ("Louie Varland".to_string(), "WSN".to_string())
        );
        assert_eq!(
            aliases.canonical_key("Nobody", "FA"),
            ("Nobody".to_string(), "FA".to_string())
        );
    }

    #[test]
    fn override_only_matches_its_team() {
        let aliases = pitcher_aliases();
        assert_eq!(
            aliases.canonical_key("Carl Edwards Jr.", "SDP").1,
            "SDP".to_string()
        );
    }

    #[test]
    fn canonicalize_rows_counts_changes() {
        let aliases = AliasMap {
            names: HashMap::from([("Jack WInkler".to_string(), "Jack Winkler".to_string())]),
            ..AliasMap::default()
        };
        let mut rows = vec![RawRow::new("Jack WInkler", "SFG"), RawRow::new("Other", "SFG")];
        assert_eq!(canonicalize_rows(&mut rows, &aliases), 1);
        assert_eq!(rows[0].name, "Jack Winkler");
    }

    fn small_table() -> RankedTable {
        let rows = vec![
            RawRow::new("Louie Varland", "TBR").with("IP", 60.0).with("SO", 70),
            RawRow::new("MacKenzie Gore", "WSN").with("IP", 150.0).with("SO", 180),
            RawRow::new("Unknown Arm", "MIA").with("IP", 10.0).with("SO", 9),
        ];
        rank_players(&rows, &ScoringProfile::pitchers())
    }

    #[test]
    fn join_rewrites_secondary_keys_and_keeps_unmatched() {
        let mut table = small_table();
        let entries = vec![
            entry("Louis Varland", "TB", "RP"),
            entry("MacKenzie Gore", "WSH", "SP"),
        ];
        let report = attach_positions(&mut table, &entries, &pitcher_aliases());
        assert_eq!(report, JoinReport { matched: 2, unmatched: 1 });
        assert_eq!(table.len(), 3);
        assert_eq!(table.find("Louie Varland").unwrap().pos.as_deref(), Some("RP"));
        assert_eq!(table.find("MacKenzie Gore").unwrap().pos.as_deref(), Some("SP"));
        assert_eq!(table.find("Unknown Arm").unwrap().pos, None);
    }

    #[test]
    fn first_entry_wins_on_duplicate_key() {
        let mut table = small_table();
        let entries = vec![
            entry("MacKenzie Gore", "WSN", "SP"),
            entry("MacKenzie Gore", "WSN", "RP"),
        ];
        attach_positions(&mut table, &entries, &AliasMap::default());
        assert_eq!(table.find("MacKenzie Gore").unwrap().pos.as_deref(), Some("SP"));
    }

    #[test]
    fn blank_position_is_missing() {
        let mut table = small_table();
        attach_positions(
            &mut table,
            &[entry("Unknown Arm", "MIA", "  ")],
            &AliasMap::default(),
        );
        assert_eq!(table.find("Unknown Arm").unwrap().pos, None);
    }

    #[test]
    fn alias_book_missing_sections_default_to_empty() {
        let json = r#"{
            "pitchers": { "positions": { "teams": { "WSH": "WSN" } } },
            "hitters": { "stats": { "names": { "Jack WInkler": "Jack Winkler" } } }
        }"#;
        let book: AliasBook = serde_json::from_str(json).unwrap();
        assert_eq!(
            book.pitchers.positions.teams.get("WSH").map(String::as_str),
            Some("WSN")
        );
        assert!(book.pitchers.stats.is_empty());
        assert_eq!(
            book.for_kind(PlayerKind::Hitter)
                .stats
                .names
                .get("Jack WInkler")
                .map(String::as_str),
            Some("Jack Winkler")
        );
        assert!(book.hitters.positions.is_empty());
    }
}
