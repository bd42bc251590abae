// CSV artifact for handing ranked tables from a compute step to a presentation step.

use std::io::{Read, Write};
use std::path::Path;

use crate::category::PlayerKind;
use crate::ranking::{RankedPlayer, RankedTable};

const LEADING: [&str; 4] = ["Rank", "Name", "Team", "Pos"];
const TOTAL: &str = "Total Score";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed artifact: {0}")]
    Format(String),
}

/// The header row for a table: `Rank,Name,Team,Pos,<columns>,Total Score`.
pub fn header(columns: &[String]) -> Vec<String> {
    LEADING
        .iter()
        .map(|s| s.to_string())
        .chain(columns.iter().cloned())
        .chain(std::iter::once(TOTAL.to_string()))
        .collect()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write a ranked table as CSV. Category cells hold standard scores; missing
/// values are empty cells.
pub fn write_ranked_table<W: Write>(writer: W, table: &RankedTable) -> Result<(), ArtifactError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header(&table.columns))?;
    for player in &table.players {
        let mut record = vec![
            player.rank.to_string(),
            player.name.clone(),
            player.team.clone(),
            player.pos.clone().unwrap_or_default(),
        ];
        record.extend(player.scores.iter().map(|s| cell(*s)));
        record.push(player.total.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(|e| ArtifactError::Csv(e.into()))?;
    Ok(())
}

/// Write a ranked table to a file, creating parent directories as needed.
pub fn save_ranked_table(path: &Path, table: &RankedTable) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_ranked_table(file, table)
}

fn parse_cell(raw: &str, column: &str, line: usize) -> Result<Option<f64>, ArtifactError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| ArtifactError::Format(format!("line {line}: bad {column} value '{trimmed}'")))
}

/// Read a ranked table back from CSV.
///
/// Raw values, usage volume and population statistics are not part of the
/// artifact; the rebuilt table carries scores, totals and ranks only. Rows
/// are kept in file order.
pub fn read_ranked_table<R: Read>(reader: R, kind: PlayerKind) -> Result<RankedTable, ArtifactError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let names: Vec<&str> = headers.iter().collect();

    if names.len() < LEADING.len() + 1
        || names[..LEADING.len()] != LEADING
        || names.last() != Some(&TOTAL)
    {
        return Err(ArtifactError::Format(format!(
            "unexpected header: {}",
            names.join(",")
        )));
    }
    let columns: Vec<String> = names[LEADING.len()..names.len() - 1]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut players = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = i + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let rank = field(0)
            .parse::<usize>()
            .map_err(|_| ArtifactError::Format(format!("line {line}: bad Rank '{}'", field(0))))?;
        let pos = Some(field(3).to_string()).filter(|p| !p.is_empty());
        let scores = columns
            .iter()
            .enumerate()
            .map(|(c, column)| parse_cell(field(LEADING.len() + c), column, line))
            .collect::<Result<Vec<_>, _>>()?;
        let total = parse_cell(field(names.len() - 1), TOTAL, line)?.unwrap_or(0.0);

        players.push(RankedPlayer {
            rank,
            name: field(1).to_string(),
            team: field(2).to_string(),
            pos,
            raw: vec![None; columns.len()],
            volume: None,
            scores,
            total,
        });
    }

    Ok(RankedTable {
        kind,
        columns,
        stats: Vec::new(),
        players,
        excluded: 0,
    })
}

/// Read a ranked table from a file.
pub fn load_ranked_table(path: &Path, kind: PlayerKind) -> Result<RankedTable, ArtifactError> {
    let file = std::fs::File::open(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_ranked_table(file, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{RawRow, ScoringProfile};
    use crate::ranking::rank_players;

    fn sample_table() -> RankedTable {
        let rows = vec![
            RawRow::new("Tarik Skubal", "DET")
                .with("IP", 190.0)
                .with("W", 15)
                .with("ERA", 2.4)
                .with("WHIP", 0.9)
                .with("SO", 230)
                .with("SV", 0)
                .with("HLD", 0),
            RawRow::new("Emmanuel Clase", "CLE")
                .with("IP", 70.0)
                .with("W", 4)
                .with("ERA", 1.8)
                .with("WHIP", 0.85)
                .with("SO", 65)
                .with("SV", 45)
                .with("HLD", 0),
            RawRow::new("Spot Starter", "COL")
                .with("IP", 40.0)
                .with("W", 1)
                .with("ERA", 6.5)
                .with("SO", 25)
                .with("SV", 0)
                .with("HLD", 2),
        ];
        let mut table = rank_players(&rows, &ScoringProfile::pitchers());
        table.players[0].pos = Some("SP".into());
        table
    }

    #[test]
    fn header_layout() {
        let columns = ScoringProfile::hitters().columns();
        assert_eq!(
            header(&columns).join(","),
            "Rank,Name,Team,Pos,R,HR,RBI,SB,AVG,Total Score"
        );
    }

    #[test]
    fn written_table_reads_back_with_same_order_and_scores() {
        let table = sample_table();
        let mut buf = Vec::new();
        write_ranked_table(&mut buf, &table).unwrap();

        let back = read_ranked_table(buf.as_slice(), PlayerKind::Pitcher).unwrap();
        assert_eq!(back.columns, table.columns);
        assert_eq!(back.len(), table.len());
        for (a, b) in back.players.iter().zip(&table.players) {
            assert_eq!(a.rank, b.rank);
            assert_eq!(a.name, b.name);
            assert_eq!(a.pos, b.pos);
            assert_eq!(a.scores, b.scores);
            assert_eq!(a.total, b.total);
        }
    }

    #[test]
    fn missing_score_is_empty_cell() {
        let table = sample_table();
        let mut buf = Vec::new();
        write_ranked_table(&mut buf, &table).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let spot = text.lines().find(|l| l.contains("Spot Starter")).unwrap();
        // WHIP is the third category
        let cells: Vec<&str> = spot.split(',').collect();
        assert_eq!(cells[6], "");
    }

    #[test]
    fn bad_header_is_rejected() {
        let csv = "Name,Team,W\nX,NYY,3\n";
        let err = read_ranked_table(csv.as_bytes(), PlayerKind::Pitcher).unwrap_err();
        assert!(matches!(err, ArtifactError::Format(_)));
    }

    #[test]
    fn bad_number_reports_line() {
        let csv = "Rank,Name,Team,Pos,HR,Total Score\n1,A,NYY,OF,abc,1.0\n";
        let err = read_ranked_table(csv.as_bytes(), PlayerKind::Hitter).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn save_and_load_through_file() {
        let dir = std::env::temp_dir().join("statline_artifact_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("pitchers.csv");
        let table = sample_table();
        save_ranked_table(&path, &table).unwrap();
        let back = load_ranked_table(&path, PlayerKind::Pitcher).unwrap();
        assert_eq!(back.players[0].name, table.players[0].name);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_ranked_table(Path::new("/nonexistent/statline.csv"), PlayerKind::Hitter)
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
