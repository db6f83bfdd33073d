//! Series files on disk.
//!
//! Layout: `{dest_dir}/{stem}.csv`, header `date,value`, one row per session.
//!
//! Writes go to `{stem}.csv.tmp` first and are renamed into place, so a
//! failed write never leaves a truncated file behind and a successful one
//! always replaces the previous run's file in full.

use crate::indicators::SeriesId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File extension of every series file.
pub const SERIES_EXTENSION: &str = "csv";

/// Header written at the top of every series file.
pub const SERIES_HEADER: [&str; 2] = ["date", "value"];

/// One row of a persisted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("series file not found: {0}")]
    NotFound(PathBuf),

    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Directory holding one CSV per series.
///
/// The directory is expected to exist; the store never creates it.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    dir: PathBuf,
}

impl SeriesStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing a series.
    pub fn path_for(&self, id: &SeriesId) -> PathBuf {
        self.dir.join(format!("{}.{SERIES_EXTENSION}", id.stem()))
    }

    /// Replace a series file with `points`, returning the final path.
    ///
    /// An empty slice still writes the header line.
    pub fn write(&self, id: &SeriesId, points: &[SeriesPoint]) -> Result<PathBuf, SeriesError> {
        let path = self.path_for(id);
        let tmp_path = path.with_extension(format!("{SERIES_EXTENSION}.tmp"));

        let bytes = encode_csv(points).map_err(|source| SeriesError::Csv {
            path: path.clone(),
            source,
        })?;

        fs::write(&tmp_path, bytes).map_err(|source| SeriesError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            SeriesError::Io {
                path: path.clone(),
                source,
            }
        })?;

        debug!(path = %path.display(), rows = points.len(), "series written");
        Ok(path)
    }

    /// Load a series file, checking that both canonical columns exist.
    pub fn read(&self, id: &SeriesId) -> Result<Vec<SeriesPoint>, SeriesError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(SeriesError::NotFound(path));
        }

        let mut rdr = csv::Reader::from_path(&path).map_err(|source| SeriesError::Csv {
            path: path.clone(),
            source,
        })?;

        let headers = rdr
            .headers()
            .map_err(|source| SeriesError::Csv {
                path: path.clone(),
                source,
            })?
            .clone();
        for column in SERIES_HEADER {
            if !headers.iter().any(|h| h == column) {
                return Err(SeriesError::MissingColumn {
                    path: path.clone(),
                    column,
                });
            }
        }

        let points = rdr
            .deserialize()
            .collect::<Result<Vec<SeriesPoint>, _>>()
            .map_err(|source| SeriesError::Csv {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), rows = points.len(), "series loaded");
        Ok(points)
    }
}

/// Render points as CSV with an explicit header.
///
/// The header is written by hand because the serde path only emits one
/// alongside the first record.
fn encode_csv(points: &[SeriesPoint]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);

    wtr.write_record(SERIES_HEADER)?;
    for point in points {
        wtr.serialize(point)?;
    }

    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> (TempDir, SeriesStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SeriesStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn path_uses_sanitized_stem() {
        let store = SeriesStore::new("/srv/public");
        let id = SeriesId::new("Bitcoin (BTC-USD)");
        assert_eq!(
            store.path_for(&id),
            PathBuf::from("/srv/public/Bitcoin_BTCUSD.csv")
        );
    }

    #[test]
    fn writes_header_and_iso_dates() {
        let (_dir, store) = store();
        let id = SeriesId::new("Gold");
        let path = store
            .write(
                &id,
                &[
                    SeriesPoint::new(date(2020, 1, 2), 1528.1),
                    SeriesPoint::new(date(2020, 1, 3), 1552.4),
                ],
            )
            .unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "date,value\n2020-01-02,1528.1\n2020-01-03,1552.4\n");
    }

    #[test]
    fn empty_series_still_has_header() {
        let (_dir, store) = store();
        let path = store.write(&SeriesId::new("Empty"), &[]).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "date,value\n");
    }

    #[test]
    fn rewrite_replaces_previous_content() {
        let (_dir, store) = store();
        let id = SeriesId::new("Copper");
        store
            .write(
                &id,
                &[
                    SeriesPoint::new(date(2020, 1, 2), 2.8),
                    SeriesPoint::new(date(2020, 1, 3), 2.9),
                ],
            )
            .unwrap();
        store
            .write(&id, &[SeriesPoint::new(date(2021, 6, 1), 4.5)])
            .unwrap();

        let back = store.read(&id).unwrap();
        assert_eq!(back, vec![SeriesPoint::new(date(2021, 6, 1), 4.5)]);
        assert!(!store.path_for(&id).with_extension("csv.tmp").exists());
    }

    #[test]
    fn read_back_preserves_order_and_duplicates() {
        let (_dir, store) = store();
        let id = SeriesId::new("VIX Index");
        let points = vec![
            SeriesPoint::new(date(2020, 1, 3), 14.0),
            SeriesPoint::new(date(2020, 1, 2), 12.5),
            SeriesPoint::new(date(2020, 1, 2), 12.5),
        ];
        store.write(&id, &points).unwrap();
        assert_eq!(store.read(&id).unwrap(), points);
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, store) = store();
        let err = store.read(&SeriesId::new("Nope")).unwrap_err();
        assert!(matches!(err, SeriesError::NotFound(_)));
    }

    #[test]
    fn missing_value_column_is_rejected() {
        let (dir, store) = store();
        fs::write(dir.path().join("Odd.csv"), "date,close\n2020-01-02,1.0\n").unwrap();
        let err = store.read(&SeriesId::new("Odd")).unwrap_err();
        match err {
            SeriesError::MissingColumn { column, .. } => assert_eq!(column, "value"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_value_is_rejected() {
        let (dir, store) = store();
        fs::write(dir.path().join("Bad.csv"), "date,value\n2020-01-02,abc\n").unwrap();
        let err = store.read(&SeriesId::new("Bad")).unwrap_err();
        assert!(matches!(err, SeriesError::Csv { .. }));
    }

    #[test]
    fn write_into_missing_directory_fails_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let store = SeriesStore::new(&missing);
        let err = store
            .write(&SeriesId::new("Gold"), &[SeriesPoint::new(date(2020, 1, 2), 1.0)])
            .unwrap_err();
        assert!(matches!(err, SeriesError::Io { .. }));
        assert!(!missing.exists());
    }
}
