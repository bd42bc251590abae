// Upstream statistics adapters: local CSV exports or the same layout over HTTP.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use statline_engine::{PlayerKind, PositionEntry, RawRow};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{Config, SourceKind};
use crate::window::{today, EvaluationWindow, Timeframe};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("request to {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Supplies raw per-player rows. Implementations do I/O only; the engine
/// does all interpretation of the columns.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Human-readable location for logs.
    fn describe(&self) -> String;

    /// Aggregated stats for every player of `kind` over `window`.
    async fn fetch_stats(
        &self,
        kind: PlayerKind,
        window: EvaluationWindow,
    ) -> Result<Vec<RawRow>, SourceError>;

    /// Per-event rows (one per pitch or batted ball) over a recent timeframe.
    async fn fetch_events(
        &self,
        kind: PlayerKind,
        timeframe: Timeframe,
    ) -> Result<Vec<RawRow>, SourceError>;
}

/// File name of the aggregated stats table for a player kind.
pub fn stats_file(kind: PlayerKind) -> &'static str {
    match kind {
        PlayerKind::Pitcher => "pitching.csv",
        PlayerKind::Hitter => "batting.csv",
    }
}

/// File name of the per-event table for a player kind.
pub fn events_file(kind: PlayerKind) -> &'static str {
    match kind {
        PlayerKind::Pitcher => "statcast_pitcher.csv",
        PlayerKind::Hitter => "statcast_batter.csv",
    }
}

/// Build the source named by `[source]`.
pub fn build_source(config: &Config) -> Result<Arc<dyn StatsSource>, SourceError> {
    let source: Arc<dyn StatsSource> = match config.source.kind {
        SourceKind::CsvDir => Arc::new(CsvDirSource::new(&config.source.location)),
        SourceKind::Http => Arc::new(HttpCsvSource::new(
            &config.source.location,
            Duration::from_secs(config.source.timeout_secs),
        )?),
    };
    Ok(source)
}

// ---------------------------------------------------------------------------
// CSV row parsing
// ---------------------------------------------------------------------------

/// One upstream CSV row. Identity columns are named; every other column is
/// absorbed into `fields` with whatever type the CSV reader infers.
#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct CsvStatRow {
    #[serde(alias = "player_name")]
    Name: String,
    #[serde(default)]
    Team: String,
    #[serde(flatten)]
    fields: HashMap<String, serde_json::Value>,
}

/// Parse upstream rows from any reader. Malformed rows are skipped with a warning.
pub fn rows_from_reader<R: Read>(rdr: R) -> Result<Vec<RawRow>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<CsvStatRow>() {
        match result {
            Ok(raw) => {
                let name = raw.Name.trim();
                if name.is_empty() {
                    warn!("skipping row with empty Name");
                    continue;
                }
                rows.push(RawRow {
                    name: name.to_string(),
                    team: raw.Team.trim().to_string(),
                    fields: raw.fields,
                });
            }
            Err(e) => {
                warn!("skipping malformed stats row: {}", e);
            }
        }
    }
    Ok(rows)
}

fn positions_from_reader<R: Read>(rdr: R) -> Result<Vec<PositionEntry>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut entries = Vec::new();
    for result in reader.deserialize::<PositionEntry>() {
        match result {
            Ok(mut entry) => {
                entry.name = entry.name.trim().to_string();
                entry.team = entry.team.trim().to_string();
                entries.push(entry);
            }
            Err(e) => {
                warn!("skipping malformed position row: {}", e);
            }
        }
    }
    Ok(entries)
}

/// Load a position table. Any failure degrades to an empty table.
pub fn load_positions(path: &Path) -> Vec<PositionEntry> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("position file {} unavailable ({}); no positions", path.display(), e);
            return Vec::new();
        }
    };
    match positions_from_reader(file) {
        Ok(entries) => {
            debug!("Loaded {} position entries from {}", entries.len(), path.display());
            entries
        }
        Err(e) => {
            warn!("failed to parse {}: {}; no positions", path.display(), e);
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Local directory source
// ---------------------------------------------------------------------------

/// Reads `<root>/<window>/pitching.csv`, `<root>/<window>/batting.csv` and
/// `<root>/<timeframe>/statcast_*.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    root: PathBuf,
}

impl CsvDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CsvDirSource { root: root.into() }
    }

    async fn read_rows(&self, path: PathBuf) -> Result<Vec<RawRow>, SourceError> {
        let bytes = tokio::fs::read(&path).await.map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let rows = rows_from_reader(bytes.as_slice()).map_err(|e| SourceError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;
        info!("Read {} rows from {}", rows.len(), path.display());
        Ok(rows)
    }
}

#[async_trait]
impl StatsSource for CsvDirSource {
    fn describe(&self) -> String {
        format!("csv_dir:{}", self.root.display())
    }

    async fn fetch_stats(
        &self,
        kind: PlayerKind,
        window: EvaluationWindow,
    ) -> Result<Vec<RawRow>, SourceError> {
        let path = self.root.join(window.path_segment()).join(stats_file(kind));
        self.read_rows(path).await
    }

    async fn fetch_events(
        &self,
        kind: PlayerKind,
        timeframe: Timeframe,
    ) -> Result<Vec<RawRow>, SourceError> {
        let path = self.root.join(timeframe.slug()).join(events_file(kind));
        self.read_rows(path).await
    }
}

// ---------------------------------------------------------------------------
// HTTP source
// ---------------------------------------------------------------------------

/// Fetches the same relative layout as [`CsvDirSource`] from a base URL.
/// Recent windows carry `start_dt` / `end_dt` query parameters.
#[derive(Debug, Clone)]
pub struct HttpCsvSource {
    base: String,
    http: reqwest::Client,
}

impl HttpCsvSource {
    /// `timeout` bounds connecting and the whole request, body included.
    /// A silent upstream surfaces as `SourceError::Http` instead of a hang.
    pub fn new(base: &str, timeout: Duration) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(SourceError::Client)?;
        Ok(HttpCsvSource {
            base: base.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// URL and query parameters for a relative file under a window segment.
    pub fn request_for(
        &self,
        segment: &str,
        file: &str,
        range: Option<(chrono::NaiveDate, chrono::NaiveDate)>,
    ) -> (String, Vec<(&'static str, String)>) {
        let url = format!("{}/{}/{}", self.base, segment, file);
        let query = match range {
            Some((start, end)) => vec![
                ("start_dt", start.format("%Y-%m-%d").to_string()),
                ("end_dt", end.format("%Y-%m-%d").to_string()),
            ],
            None => Vec::new(),
        };
        (url, query)
    }

    async fn get_rows(
        &self,
        url: String,
        query: Vec<(&'static str, String)>,
    ) -> Result<Vec<RawRow>, SourceError> {
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| SourceError::Http {
                url: url.clone(),
                source: e,
            })?;
        if !response.status().is_success() {
            return Err(SourceError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        let body = response.bytes().await.map_err(|e| SourceError::Http {
            url: url.clone(),
            source: e,
        })?;
        let rows = rows_from_reader(body.as_ref()).map_err(|e| SourceError::Csv {
            path: url.clone(),
            source: e,
        })?;
        info!("Fetched {} rows from {}", rows.len(), url);
        Ok(rows)
    }
}

#[async_trait]
impl StatsSource for HttpCsvSource {
    fn describe(&self) -> String {
        format!("http:{}", self.base)
    }

    async fn fetch_stats(
        &self,
        kind: PlayerKind,
        window: EvaluationWindow,
    ) -> Result<Vec<RawRow>, SourceError> {
        let (url, query) =
            self.request_for(&window.path_segment(), stats_file(kind), window.date_range(today()));
        self.get_rows(url, query).await
    }

    async fn fetch_events(
        &self,
        kind: PlayerKind,
        timeframe: Timeframe,
    ) -> Result<Vec<RawRow>, SourceError> {
        let (url, query) = self.request_for(
            timeframe.slug(),
            events_file(kind),
            Some(timeframe.date_range(today())),
        );
        self.get_rows(url, query).await
    }
}

// ---------------------------------------------------------------------------
// In-memory source for tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves fixed rows; can be switched to fail and records call counts.
    pub(crate) struct FakeSource {
        pitchers: Vec<RawRow>,
        hitters: Vec<RawRow>,
        events: Mutex<Vec<RawRow>>,
        failing: AtomicBool,
        stats_calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSource {
        pub(crate) fn new(pitchers: Vec<RawRow>, hitters: Vec<RawRow>) -> Self {
            FakeSource {
                pitchers,
                hitters,
                events: Mutex::new(Vec::new()),
                failing: AtomicBool::new(false),
                stats_calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }

        pub(crate) fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub(crate) fn set_events(&self, rows: Vec<RawRow>) {
            *self.events.lock().unwrap() = rows;
        }

        pub(crate) fn stats_calls(&self) -> usize {
            self.stats_calls.load(Ordering::SeqCst)
        }

        pub(crate) fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatsSource for FakeSource {
        fn describe(&self) -> String {
            "fake".into()
        }

        async fn fetch_stats(
            &self,
            kind: PlayerKind,
            _window: EvaluationWindow,
        ) -> Result<Vec<RawRow>, SourceError> {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.load(Ordering::SeqCst) {
                return Err(SourceError::Status {
                    url: "fake://stats".into(),
                    status: 503,
                });
            }
            Ok(match kind {
                PlayerKind::Pitcher => self.pitchers.clone(),
                PlayerKind::Hitter => self.hitters.clone(),
            })
        }

        async fn fetch_events(
            &self,
            _kind: PlayerKind,
            _timeframe: Timeframe,
        ) -> Result<Vec<RawRow>, SourceError> {
            Ok(self.events.lock().unwrap().clone())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
