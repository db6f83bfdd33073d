//! Indicator definitions and the ordered set the fetch loop walks.
//!
//! The set is validated once when it is built: display names must be unique
//! and must not collide after sanitization, otherwise one series would silently
//! overwrite another on disk.

use crate::config::ConfigError;
use crate::sanitize::sanitize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Identifier of one persisted series.
///
/// Carries the display name and the file stem derived from it. Both the
/// fetcher (when writing) and the spread deriver (when reading) resolve files
/// through this type, so the naming rule lives in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId {
    name: String,
    stem: String,
}

impl SeriesId {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let stem = sanitize(&name);
        Self { name, stem }
    }

    /// Human-readable display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sanitized file base name, without extension.
    pub fn stem(&self) -> &str {
        &self.stem
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One tracked indicator: what to call it and what to ask the provider for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorDef {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "symbol")]
    pub provider_symbol: String,
}

impl IndicatorDef {
    pub fn new(display_name: impl Into<String>, provider_symbol: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            provider_symbol: provider_symbol.into(),
        }
    }

    pub fn series_id(&self) -> SeriesId {
        SeriesId::new(&self.display_name)
    }
}

/// Display name of the long end of the default spread.
pub const TEN_YEAR_YIELD: &str = "US 10Y Treasury Yield (TNX)";

/// Display name of the short end of the default spread.
pub const THIRTEEN_WEEK_RATE: &str = "US 13W T-Bill Rate (IRX)";

/// Compiled-in indicator list, in fetch order.
const DEFAULT_INDICATORS: [(&str, &str); 15] = [
    ("USDJPY", "JPY=X"),
    ("S&P 500", "^GSPC"),
    ("Dow Jones (DJI)", "^DJI"),
    ("NASDAQ (IXIC)", "^IXIC"),
    ("WTI Crude Oil", "CL=F"),
    ("Brent Crude Oil", "BZ=F"),
    ("Copper", "HG=F"),
    ("Gold", "GC=F"),
    ("Silver", "SI=F"),
    ("VIX Index", "^VIX"),
    ("US Dollar Index (DXY)", "DX-Y.NYB"),
    (TEN_YEAR_YIELD, "^TNX"),
    (THIRTEEN_WEEK_RATE, "^IRX"),
    ("US 30Y Treasury Yield (TYX)", "^TYX"),
    ("Bitcoin (BTC-USD)", "BTC-USD"),
];

/// Ordered, collision-free set of indicator definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    defs: Vec<IndicatorDef>,
}

impl IndicatorSet {
    /// Build a set, rejecting empty names and file-name collisions.
    pub fn new(defs: Vec<IndicatorDef>) -> Result<Self, ConfigError> {
        let mut stems: HashMap<String, &str> = HashMap::with_capacity(defs.len());

        for def in &defs {
            if def.provider_symbol.trim().is_empty() {
                return Err(ConfigError::EmptySymbol {
                    name: def.display_name.clone(),
                });
            }

            let id = def.series_id();
            if id.stem().is_empty() {
                return Err(ConfigError::EmptyFileName {
                    name: def.display_name.clone(),
                });
            }

            if let Some(prev) = stems.get(id.stem()) {
                if *prev == def.display_name {
                    return Err(ConfigError::DuplicateName {
                        name: def.display_name.clone(),
                    });
                }
                return Err(ConfigError::FileNameCollision {
                    first: prev.to_string(),
                    second: def.display_name.clone(),
                    stem: id.stem().to_string(),
                });
            }
            stems.insert(id.stem().to_string(), &def.display_name);
        }

        Ok(Self { defs })
    }

    /// The compiled-in fifteen indicators.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::new(
            DEFAULT_INDICATORS
                .iter()
                .map(|(name, symbol)| IndicatorDef::new(*name, *symbol))
                .collect(),
        )
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndicatorDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Look up a definition by display name.
    pub fn get(&self, display_name: &str) -> Option<&IndicatorDef> {
        self.defs.iter().find(|d| d.display_name == display_name)
    }

    /// True if any member writes to the given file stem.
    pub fn contains_stem(&self, stem: &str) -> bool {
        self.defs.iter().any(|d| d.series_id().stem() == stem)
    }
}

impl<'a> IntoIterator for &'a IndicatorSet {
    type Item = &'a IndicatorDef;
    type IntoIter = std::slice::Iter<'a, IndicatorDef>;

    fn into_iter(self) -> Self::IntoIter {
        self.defs.iter()
    }
}
