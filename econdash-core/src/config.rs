//! Run configuration: indicator set, destination directory, spread legs.
//!
//! `RunConfig::default()` is the compiled-in setup. A TOML file can replace
//! any part of it:
//!
//! ```toml
//! dest_dir = "public"
//! start = "1900-01-01"
//!
//! [[indicator]]
//! name = "Gold"
//! symbol = "GC=F"
//!
//! [spread]
//! name = "Yield Spread 10Y minus 13W"
//! long = "US 10Y Treasury Yield (TNX)"
//! short = "US 13W T-Bill Rate (IRX)"
//! ```

use crate::indicators::{IndicatorDef, IndicatorSet, SeriesId};
use crate::spread::{SpreadSpec, DEFAULT_SPREAD_NAME};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default destination directory, relative to the working directory.
pub const DEFAULT_DEST_DIR: &str = "public";

/// Earliest date ever requested; the provider clamps it to its first bar.
pub fn history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate indicator name '{name}'")]
    DuplicateName { name: String },

    #[error("'{first}' and '{second}' both map to file '{stem}'")]
    FileNameCollision {
        first: String,
        second: String,
        stem: String,
    },

    #[error("indicator '{name}' has an empty file name after sanitizing")]
    EmptyFileName { name: String },

    #[error("indicator '{name}' has no provider symbol")]
    EmptySymbol { name: String },

    #[error("spread leg '{name}' is not a configured indicator")]
    UnknownSpreadLeg { name: String },

    #[error("spread output '{name}' would overwrite an indicator file")]
    SpreadOverwritesIndicator { name: String },

    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dest_dir: PathBuf,
    pub start: NaiveDate,
    pub indicators: IndicatorSet,
    /// `None` skips the spread step.
    pub spread: Option<SpreadSpec>,
}

impl RunConfig {
    /// Compiled-in configuration.
    pub fn builtin() -> Result<Self, ConfigError> {
        let indicators = IndicatorSet::builtin()?;
        let spread = SpreadSpec::ten_year_minus_thirteen_week(&indicators);
        let config = Self {
            dest_dir: PathBuf::from(DEFAULT_DEST_DIR),
            start: history_start(),
            indicators,
            spread,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Omitted keys take compiled-in values.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;

        let indicators = match file.indicator {
            Some(defs) => IndicatorSet::new(defs)?,
            None => IndicatorSet::builtin()?,
        };

        let spread = match file.spread {
            Some(section) => Some(section.resolve(&indicators)?),
            None => SpreadSpec::ten_year_minus_thirteen_week(&indicators),
        };

        let config = Self {
            dest_dir: file
                .dest_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEST_DIR)),
            start: file.start.unwrap_or_else(history_start),
            indicators,
            spread,
        };
        config.validate()?;
        Ok(config)
    }

    /// Every series a run writes: indicators in order, then the spread.
    pub fn series_ids(&self) -> Vec<SeriesId> {
        self.indicators
            .iter()
            .map(IndicatorDef::series_id)
            .chain(self.spread.as_ref().map(|spec| spec.output.clone()))
            .collect()
    }

    /// Check cross-section invariants the individual pieces cannot see.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(spec) = &self.spread {
            if self.indicators.contains_stem(spec.output.stem()) {
                return Err(ConfigError::SpreadOverwritesIndicator {
                    name: spec.output.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    dest_dir: Option<PathBuf>,
    start: Option<NaiveDate>,
    indicator: Option<Vec<IndicatorDef>>,
    spread: Option<SpreadSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpreadSection {
    name: Option<String>,
    long: String,
    short: String,
}

impl SpreadSection {
    /// Legs are given by display name and must exist in the set, so the
    /// spread reads exactly the files the download loop writes.
    fn resolve(self, indicators: &IndicatorSet) -> Result<SpreadSpec, ConfigError> {
        let leg = |name: &str| {
            indicators
                .get(name)
                .map(IndicatorDef::series_id)
                .ok_or_else(|| ConfigError::UnknownSpreadLeg {
                    name: name.to_string(),
                })
        };
        let long = leg(&self.long)?;
        let short = leg(&self.short)?;
        let output = SeriesId::new(self.name.unwrap_or_else(|| DEFAULT_SPREAD_NAME.to_string()));
        Ok(SpreadSpec::new(output, long, short))
    }
}
