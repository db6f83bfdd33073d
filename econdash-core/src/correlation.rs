//! Pairwise correlation across persisted series.
//!
//! Each series is keyed by date; a pair of series is compared only on the
//! dates both carry. The coefficient is the sample (Pearson) correlation,
//! reported as 0 when fewer than two dates pair up or either side is flat.

use crate::data::{SeriesPoint, SeriesStore};
use crate::indicators::SeriesId;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Symmetric matrix of coefficients, rows and columns in `ids` order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    ids: Vec<SeriesId>,
    values: Vec<Vec<f64>>,
}

/// One off-diagonal entry of the matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PairCorrelation {
    pub first: SeriesId,
    pub second: SeriesId,
    pub value: f64,
}

impl CorrelationMatrix {
    pub fn ids(&self) -> &[SeriesId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Coefficient at row `i`, column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i)?.get(j).copied()
    }

    /// Coefficient between two series by file stem.
    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.ids.iter().position(|id| id.stem() == a)?;
        let j = self.ids.iter().position(|id| id.stem() == b)?;
        self.get(i, j)
    }

    /// Every unordered pair, strongest positive first.
    ///
    /// Ties keep matrix order.
    pub fn ranked_pairs(&self) -> Vec<PairCorrelation> {
        let n = self.ids.len();
        let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in i + 1..n {
                pairs.push(PairCorrelation {
                    first: self.ids[i].clone(),
                    second: self.ids[j].clone(),
                    value: self.values[i][j],
                });
            }
        }
        pairs.sort_by(|a, b| b.value.total_cmp(&a.value));
        pairs
    }
}

/// Sample correlation of two equally long slices.
///
/// Returns 0 for fewer than two points, mismatched lengths, zero variance,
/// or a non-finite result.
pub fn sample_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n < 2 || n != y.len() {
        return 0.0;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let r = sxy / (sxx.sqrt() * syy.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Values of `a` and `b` on the dates both carry, in date order.
///
/// A date repeated within one series keeps its last value.
pub fn paired_values(a: &[SeriesPoint], b: &[SeriesPoint]) -> (Vec<f64>, Vec<f64>) {
    pair_maps(&by_date(a), &by_date(b))
}

/// Build the matrix from already-loaded series.
pub fn correlation_matrix(series: &[(SeriesId, Vec<SeriesPoint>)]) -> CorrelationMatrix {
    let maps: Vec<BTreeMap<NaiveDate, f64>> =
        series.iter().map(|(_, points)| by_date(points)).collect();
    let n = maps.len();

    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i..n {
            let (x, y) = pair_maps(&maps[i], &maps[j]);
            let r = sample_correlation(&x, &y);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        ids: series.iter().map(|(id, _)| id.clone()).collect(),
        values,
    }
}

/// Load each series from the store and correlate them.
///
/// A series that cannot be read takes part with no points, so every
/// coefficient involving it is 0.
pub fn correlate(store: &SeriesStore, ids: &[SeriesId]) -> CorrelationMatrix {
    let series: Vec<(SeriesId, Vec<SeriesPoint>)> = ids
        .iter()
        .map(|id| {
            let points = store.read(id).unwrap_or_else(|e| {
                warn!(series = %id, error = %e, "series unavailable for correlation");
                Vec::new()
            });
            (id.clone(), points)
        })
        .collect();

    debug!(series = series.len(), "correlating");
    correlation_matrix(&series)
}

fn by_date(points: &[SeriesPoint]) -> BTreeMap<NaiveDate, f64> {
    points
        .iter()
        .filter(|p| p.value.is_finite())
        .map(|p| (p.date, p.value))
        .collect()
}

fn pair_maps(a: &BTreeMap<NaiveDate, f64>, b: &BTreeMap<NaiveDate, f64>) -> (Vec<f64>, Vec<f64>) {
    a.iter()
        .filter_map(|(date, &x)| b.get(date).map(|&y| (x, y)))
        .unzip()
}
