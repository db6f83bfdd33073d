//! Derived yield-curve spread: long leg minus short leg, joined on date.
//!
//! Both legs are read back from the files the download loop wrote. The join is
//! inner: a date missing from either leg is dropped, never filled.

use crate::data::progress::FetchProgress;
use crate::data::series::{SeriesError, SeriesPoint, SeriesStore};
use crate::indicators::{IndicatorSet, SeriesId, TEN_YEAR_YIELD, THIRTEEN_WEEK_RATE};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Display name of the compiled-in spread series.
pub const DEFAULT_SPREAD_NAME: &str = "Yield Spread 10Y minus 13W";

/// Which two series to subtract and where the result goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadSpec {
    pub output: SeriesId,
    pub long: SeriesId,
    pub short: SeriesId,
}

impl SpreadSpec {
    pub fn new(output: SeriesId, long: SeriesId, short: SeriesId) -> Self {
        Self {
            output,
            long,
            short,
        }
    }

    /// 10Y minus 13W, with both legs resolved from the indicator set.
    ///
    /// `None` if either leg is not configured.
    pub fn ten_year_minus_thirteen_week(indicators: &IndicatorSet) -> Option<Self> {
        let long = indicators.get(TEN_YEAR_YIELD)?.series_id();
        let short = indicators.get(THIRTEEN_WEEK_RATE)?.series_id();
        Some(Self::new(SeriesId::new(DEFAULT_SPREAD_NAME), long, short))
    }
}

/// Result of the spread step.
#[derive(Debug, Clone, PartialEq)]
pub enum SpreadOutcome {
    Saved { path: PathBuf, rows: usize },
    Failed(String),
}

/// A joined row before subtraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRow {
    pub date: NaiveDate,
    pub long: f64,
    pub short: f64,
}

/// Inner join on date.
///
/// Rows come out in `long` order. A date that repeats on either side yields
/// every pairing, with the `short` matches in their original order.
pub fn inner_join(long: &[SeriesPoint], short: &[SeriesPoint]) -> Vec<JoinedRow> {
    let mut by_date: HashMap<NaiveDate, Vec<f64>> = HashMap::with_capacity(short.len());
    for p in short {
        by_date.entry(p.date).or_default().push(p.value);
    }

    let mut joined = Vec::with_capacity(long.len().min(short.len()));
    for l in long {
        if let Some(values) = by_date.get(&l.date) {
            for &s in values {
                joined.push(JoinedRow {
                    date: l.date,
                    long: l.value,
                    short: s,
                });
            }
        }
    }
    joined
}

/// `long - short` for every date present in both series.
pub fn compute_spread(long: &[SeriesPoint], short: &[SeriesPoint]) -> Vec<SeriesPoint> {
    inner_join(long, short)
        .into_iter()
        .map(|r| SeriesPoint::new(r.date, r.long - r.short))
        .collect()
}

/// Read both legs, subtract, write the output series.
///
/// Any error aborts the whole step before anything is written; the previous
/// output file, if one exists, is left as it was.
pub fn derive_spread(
    store: &SeriesStore,
    spec: &SpreadSpec,
    progress: &dyn FetchProgress,
) -> SpreadOutcome {
    match try_derive(store, spec) {
        Ok((path, rows)) => {
            progress.on_spread_saved(spec.output.name(), &path, rows);
            SpreadOutcome::Saved { path, rows }
        }
        Err(e) => {
            let detail = e.to_string();
            warn!(name = %spec.output, error = %detail, "spread failed");
            progress.on_spread_failed(spec.output.name(), &detail);
            SpreadOutcome::Failed(detail)
        }
    }
}

fn try_derive(store: &SeriesStore, spec: &SpreadSpec) -> Result<(PathBuf, usize), SeriesError> {
    let long = store.read(&spec.long)?;
    let short = store.read(&spec.short)?;
    let spread = compute_spread(&long, &short);
    let path = store.write(&spec.output, &spread)?;
    Ok((path, spread.len()))
}
