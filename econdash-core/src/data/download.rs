//! Download orchestrator: walks the indicator set, one provider call each,
//! and writes a series file per indicator that returned data.
//!
//! Every indicator is attempted. A failure is recorded against that indicator
//! and the loop carries on with the next one.

use super::progress::FetchProgress;
use super::provider::{DataError, DataProvider};
use super::series::{SeriesError, SeriesPoint, SeriesStore};
use crate::indicators::{IndicatorDef, IndicatorSet};
use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// What happened to one indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// File written with this many rows.
    Saved { path: PathBuf, rows: usize },
    /// Provider answered with zero rows; nothing written.
    NoData,
    /// Request, reshape, or write failed.
    Failed(String),
}

/// Outcome for one indicator, tagged with its display name.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorReport {
    pub name: String,
    pub outcome: FetchOutcome,
}

/// Per-indicator outcomes in configuration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub indicators: Vec<IndicatorReport>,
}

impl FetchReport {
    pub fn total(&self) -> usize {
        self.indicators.len()
    }

    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Saved { .. }))
    }

    pub fn no_data(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::NoData))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, FetchOutcome::Failed(_)))
    }

    pub fn all_saved(&self) -> bool {
        self.saved() == self.total()
    }

    /// Outcome for a display name, if it was part of the run.
    pub fn outcome(&self, name: &str) -> Option<&FetchOutcome> {
        self.indicators
            .iter()
            .find(|r| r.name == name)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&FetchOutcome) -> bool) -> usize {
        self.indicators.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Error raised inside a single indicator's attempt.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Provider(#[from] DataError),
    #[error(transparent)]
    Series(#[from] SeriesError),
}

/// Fetch every indicator in order and persist the non-empty ones.
pub fn fetch_all(
    provider: &dyn DataProvider,
    store: &SeriesStore,
    indicators: &IndicatorSet,
    start: NaiveDate,
    progress: &dyn FetchProgress,
) -> FetchReport {
    let total = indicators.len();
    let mut report = FetchReport::default();

    debug!(
        provider = provider.name(),
        total,
        dir = %store.dir().display(),
        "fetch loop starting"
    );

    for (i, def) in indicators.iter().enumerate() {
        progress.on_start(&def.display_name, i, total);

        let outcome = match fetch_single(provider, store, def, start) {
            Ok(Some((path, rows))) => {
                progress.on_saved(&def.display_name, &path, rows);
                FetchOutcome::Saved { path, rows }
            }
            Ok(None) => {
                progress.on_no_data(&def.display_name);
                FetchOutcome::NoData
            }
            Err(e) => {
                let detail = e.to_string();
                warn!(
                    name = %def.display_name,
                    symbol = %def.provider_symbol,
                    error = %detail,
                    "indicator failed"
                );
                progress.on_failed(&def.display_name, &detail);
                FetchOutcome::Failed(detail)
            }
        };

        report.indicators.push(IndicatorReport {
            name: def.display_name.clone(),
            outcome,
        });
    }

    progress.on_batch_complete(report.saved(), report.no_data(), report.failed());
    report
}

/// One indicator: fetch → reshape → write. `None` means the provider had no rows.
fn fetch_single(
    provider: &dyn DataProvider,
    store: &SeriesStore,
    def: &IndicatorDef,
    start: NaiveDate,
) -> Result<Option<(PathBuf, usize)>, AttemptError> {
    let observations = provider.fetch_history(&def.provider_symbol, start)?;
    if observations.is_empty() {
        return Ok(None);
    }

    let points: Vec<SeriesPoint> = observations
        .into_iter()
        .map(|o| SeriesPoint::new(o.date, o.close))
        .collect();

    let path = store.write(&def.series_id(), &points)?;
    Ok(Some((path, points.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcomes: Vec<FetchOutcome>) -> FetchReport {
        FetchReport {
            indicators: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| IndicatorReport {
                    name: format!("ind{i}"),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn report_counts_each_outcome_once() {
        let r = report(vec![
            FetchOutcome::Saved {
                path: PathBuf::from("a.csv"),
                rows: 3,
            },
            FetchOutcome::NoData,
            FetchOutcome::Failed("boom".into()),
            FetchOutcome::Failed("bang".into()),
        ]);
        assert_eq!(r.total(), 4);
        assert_eq!(r.saved(), 1);
        assert_eq!(r.no_data(), 1);
        assert_eq!(r.failed(), 2);
        assert!(!r.all_saved());
        assert_eq!(r.outcome("ind1"), Some(&FetchOutcome::NoData));
        assert_eq!(r.outcome("missing"), None);
    }

    #[test]
    fn empty_report_is_trivially_all_saved() {
        assert!(FetchReport::default().all_saved());
    }
}
