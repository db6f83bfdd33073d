//! Provider access, series files, and the download loop

pub mod download;
pub mod progress;
pub mod provider;
pub mod series;
pub mod yahoo;

pub use download::{fetch_all, FetchOutcome, FetchReport, IndicatorReport};
pub use progress::{FetchProgress, Notice, StdoutProgress};
pub use provider::{DataError, DataProvider, Observation};
pub use series::{SeriesError, SeriesPoint, SeriesStore};
pub use yahoo::YahooProvider;
