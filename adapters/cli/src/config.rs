//! Configuration resolved from defaults, the TOML file and flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use mindspan_core::GameKind;
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "mindspan.toml";
const DEFAULT_DATA_FILE: &str = "mindspan.json";
const DEFAULT_SPEED: f64 = 1.0;
const MIN_SPEED: f64 = 0.25;
const MAX_SPEED: f64 = 4.0;

/// Resolved configuration with defaults, file and flags merged in that order.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    data_file: PathBuf,
    default_game: GameKind,
    speed: f64,
    narration: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            default_game: GameKind::DigitSpan,
            speed: DEFAULT_SPEED,
            narration: true,
        }
    }
}

/// Shape of `mindspan.toml`; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    data_file: Option<PathBuf>,
    default_game: Option<String>,
    speed: Option<f64>,
    narration: Option<bool>,
}

impl AppConfig {
    /// Loads configuration from `path`, or from `mindspan.toml` when absent.
    ///
    /// A missing default file yields the built-in defaults; an explicitly
    /// provided path must exist.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read config file {}", path.display()));
            }
        };

        Self::parse(&raw).with_context(|| format!("failed to load config file {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(raw)?;
        Self::default().merged(file)
    }

    fn merged(mut self, file: FileConfig) -> Result<Self> {
        if let Some(data_file) = file.data_file {
            self.data_file = data_file;
        }
        if let Some(slug) = file.default_game {
            match GameKind::from_slug(&slug) {
                Some(kind) => self.default_game = kind,
                None => bail!("default_game names unknown game '{slug}'"),
            }
        }
        if let Some(speed) = file.speed {
            self.speed = validate_speed(speed)?;
        }
        if let Some(narration) = file.narration {
            self.narration = narration;
        }
        Ok(self)
    }

    /// Overrides the store path from the command line.
    #[must_use]
    pub(crate) fn with_data_file(mut self, data_file: Option<PathBuf>) -> Self {
        if let Some(data_file) = data_file {
            self.data_file = data_file;
        }
        self
    }

    /// File the journal persists to.
    #[must_use]
    pub(crate) fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// Game played when none is named on the command line.
    #[must_use]
    pub(crate) fn default_game(&self) -> GameKind {
        self.default_game
    }

    /// Presentation speed scale; larger is faster.
    #[must_use]
    pub(crate) fn speed(&self) -> f64 {
        self.speed
    }

    /// Whether revealed digits are announced.
    #[must_use]
    pub(crate) fn narration(&self) -> bool {
        self.narration
    }
}

/// Checks a speed scale against the supported range.
pub(crate) fn validate_speed(speed: f64) -> Result<f64> {
    if !speed.is_finite() || !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
        bail!("speed {speed} is outside the supported range {MIN_SPEED}..={MAX_SPEED}");
    }
    Ok(speed)
}
