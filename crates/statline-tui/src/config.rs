// Configuration loading and parsing (statline.toml, aliases.toml).

use serde::Deserialize;
use statline_engine::AliasBook;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::window::{EvaluationWindow, Timeframe};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub refresh: RefreshConfig,
    pub source: SourceConfig,
    pub ranking: RankingConfig,
    pub positions: PositionsConfig,
    pub output: OutputConfig,
    pub aliases: AliasBook,
}

impl Config {
    /// The evaluation window named by `[source] season` / `window`.
    ///
    /// Only meaningful after validation, which rejects unknown window slugs.
    pub fn window(&self) -> EvaluationWindow {
        match self.source.window.parse::<Timeframe>() {
            Ok(tf) => EvaluationWindow::Recent(tf),
            Err(_) => EvaluationWindow::Season(self.source.season),
        }
    }
}

// ---------------------------------------------------------------------------
// statline.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct StatlineFile {
    server: ServerConfig,
    #[serde(default)]
    refresh: RefreshConfig,
    source: SourceConfig,
    #[serde(default)]
    ranking: RankingConfig,
    #[serde(default)]
    positions: PositionsConfig,
    #[serde(default)]
    output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_hours: u64,
    pub initial_delay_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        RefreshConfig {
            interval_hours: 24,
            initial_delay_secs: 2,
        }
    }
}

/// Where upstream statistics come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A local directory of CSV exports.
    CsvDir,
    /// The same file layout served under an HTTP base URL.
    Http,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Directory path or base URL, depending on `kind`.
    pub location: String,
    pub season: i32,
    /// "season" or a timeframe slug (last_week, last_2_weeks, last_month).
    #[serde(default = "default_window")]
    pub window: String,
    /// Connect and request timeout for the `http` source.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_window() -> String {
    "season".into()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub min_ip: f64,
    pub min_pa: f64,
    pub default_limit: usize,
    pub filter_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            min_ip: 0.0,
            min_pa: 0.0,
            default_limit: 100,
            filter_limit: 50,
        }
    }
}

/// Position tables joined onto the rankings. Missing entries mean no positions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PositionsConfig {
    pub pitchers: Option<String>,
    pub hitters: Option<String>,
}

/// Optional CSV artifact paths written after each refresh.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pitchers_csv: Option<String>,
    pub hitters_csv: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/statline.toml` and
/// (optionally) `config/aliases.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- statline.toml (required) ---
    let statline_path = config_dir.join("statline.toml");
    let statline_text = read_file(&statline_path)?;
    let file: StatlineFile =
        toml::from_str(&statline_text).map_err(|e| ConfigError::ParseError {
            path: statline_path.clone(),
            source: e,
        })?;

    // --- aliases.toml (optional) ---
    let aliases_path = config_dir.join("aliases.toml");
    let aliases = if aliases_path.exists() {
        let text = read_file(&aliases_path)?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: aliases_path.clone(),
            source: e,
        })?
    } else {
        AliasBook::default()
    };

    let config = Config {
        server: file.server,
        refresh: file.refresh,
        source: file.source,
        ranking: file.ranking,
        positions: file.positions,
        output: file.output,
        aliases,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the crate root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Load config relative to the current working directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Upper bound on `refresh.interval_hours`.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 365;

/// Upper bound on `refresh.initial_delay_secs`: one day.
pub const MAX_INITIAL_DELAY_SECS: u64 = 24 * 60 * 60;

/// Upper bound on `source.timeout_secs`.
pub const MAX_TIMEOUT_SECS: u64 = 10 * 60;

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(invalid("server.port", "must be > 0"));
    }

    if config.refresh.interval_hours == 0 {
        return Err(invalid("refresh.interval_hours", "must be > 0"));
    }
    if config.refresh.interval_hours > MAX_INTERVAL_HOURS {
        return Err(invalid(
            "refresh.interval_hours",
            format!("must be <= {MAX_INTERVAL_HOURS} (one year)"),
        ));
    }
    if config.refresh.initial_delay_secs > MAX_INITIAL_DELAY_SECS {
        return Err(invalid(
            "refresh.initial_delay_secs",
            format!("must be <= {MAX_INITIAL_DELAY_SECS}"),
        ));
    }

    if config.source.timeout_secs == 0 || config.source.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(invalid(
            "source.timeout_secs",
            format!("must be between 1 and {MAX_TIMEOUT_SECS}"),
        ));
    }

    if config.source.location.trim().is_empty() {
        return Err(invalid("source.location", "must not be empty"));
    }
    if config.source.kind == SourceKind::Http
        && !(config.source.location.starts_with("http://")
            || config.source.location.starts_with("https://"))
    {
        return Err(invalid(
            "source.location",
            format!("must be an http(s) URL, got {}", config.source.location),
        ));
    }
    let window = config.source.window.as_str();
    if window != "season" && window.parse::<Timeframe>().is_err() {
        return Err(invalid(
            "source.window",
            format!("must be \"season\" or one of {}, got {window:?}", Timeframe::SLUGS.join(", ")),
        ));
    }

    let thresholds = [
        ("ranking.min_ip", config.ranking.min_ip),
        ("ranking.min_pa", config.ranking.min_pa),
    ];
    for (name, val) in thresholds {
        if !val.is_finite() || val < 0.0 {
            return Err(invalid(name, format!("must be >= 0, got {val}")));
        }
    }

    let limits = [
        ("ranking.default_limit", config.ranking.default_limit),
        ("ranking.filter_limit", config.ranking.filter_limit),
    ];
    for (name, val) in limits {
        if val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
