//! econdash core: end-of-day indicator snapshots.
//!
//! This crate contains the whole batch job:
//! - Indicator definitions and the display-name → file-name rule
//! - Provider trait with a Yahoo Finance implementation
//! - `date,value` series files with whole-file replacement
//! - Download loop with per-indicator failure isolation
//! - Yield-curve spread derived from two persisted series
//! - Pairwise correlation across the persisted series

pub mod config;
pub mod correlation;
pub mod data;
pub mod indicators;
pub mod pipeline;
pub mod sanitize;
pub mod spread;

pub use config::{ConfigError, RunConfig};
pub use correlation::{correlate, CorrelationMatrix, PairCorrelation};
pub use indicators::{IndicatorDef, IndicatorSet, SeriesId};
pub use pipeline::{run, RunReport};
pub use sanitize::sanitize;
pub use spread::{SpreadOutcome, SpreadSpec};
