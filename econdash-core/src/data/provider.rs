//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the market-data source so the fetch
//! loop can run against Yahoo Finance in production and a scripted provider in
//! tests.

use chrono::NaiveDate;
use thiserror::Error;

/// One daily observation as returned by a provider.
///
/// Only the close survives; everything else the provider sends is dropped at
/// parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub close: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Structured error types for provider calls.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// Trait for daily-history sources.
///
/// An empty `Vec` means the provider answered but has nothing for the symbol
/// (delisted, unknown, or an empty window). Errors are reserved for failures
/// to get an answer at all.
pub trait DataProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch every daily close from `start` (inclusive) to the latest
    /// available session, in provider order.
    fn fetch_history(&self, symbol: &str, start: NaiveDate)
        -> Result<Vec<Observation>, DataError>;
}
