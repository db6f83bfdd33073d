//! Yahoo Finance data provider.
//!
//! Fetches daily closes from Yahoo's v8 chart API. One request per symbol, no
//! retries: a failed request is reported to the caller and the run moves on.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes, so every shape assumption below maps to a `ResponseFormatChanged`
//! error instead of a panic.

use super::provider::{DataError, DataProvider, Observation};
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: Option<i64>,
}

/// How epoch timestamps map onto exchange calendar days.
#[derive(Debug, Clone, Copy)]
enum Calendar {
    /// IANA zone; daylight saving follows each bar's own date.
    Zone(Tz),
    /// Fixed offset in seconds, as last reported by the exchange.
    Fixed(i64),
}

impl Calendar {
    fn from_meta(meta: Option<ChartMeta>) -> Self {
        let Some(meta) = meta else {
            return Calendar::Fixed(0);
        };
        if let Some(name) = meta.exchange_timezone_name.as_deref() {
            match name.parse::<Tz>() {
                Ok(tz) => return Calendar::Zone(tz),
                Err(_) => debug!(zone = name, "unknown exchange timezone, using gmtoffset"),
            }
        }
        Calendar::Fixed(meta.gmtoffset.unwrap_or(0))
    }

    fn session_date(self, ts: i64) -> Option<NaiveDate> {
        match self {
            Calendar::Zone(tz) => {
                DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&tz).date_naive())
            }
            Calendar::Fixed(offset) => {
                DateTime::from_timestamp(ts.checked_add(offset)?, 0).map(|dt| dt.date_naive())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Build the chart API URL for a symbol from `start` up to `end_ts`.
    fn chart_url(symbol: &str, start: NaiveDate, end_ts: i64) -> Result<Url, DataError> {
        let start_ts = start.and_time(chrono::NaiveTime::default()).and_utc().timestamp();

        let mut url = Url::parse(CHART_BASE_URL).map_err(|e| DataError::Client(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| DataError::Client(format!("cannot append path to {CHART_BASE_URL}")))?
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "history");

        Ok(url)
    }

    /// Decide what a finished HTTP exchange means.
    ///
    /// Unknown symbols come back as 404 with a "Not Found" chart error, which
    /// is an empty answer. Any other non-success status is a failure.
    fn interpret(
        status: StatusCode,
        symbol: &str,
        body: &str,
    ) -> Result<Vec<Observation>, DataError> {
        let http_error = || DataError::Http {
            status: status.as_u16(),
            symbol: symbol.to_string(),
        };

        if status.is_success() {
            return Self::parse_response(symbol, body);
        }
        if status == StatusCode::NOT_FOUND {
            return Self::parse_response(symbol, body).map_err(|_| http_error());
        }
        Err(http_error())
    }

    /// Parse a chart API body into observations.
    ///
    /// A "Not Found" chart error and a result with no timestamps both mean the
    /// provider has nothing for the symbol, which is an empty answer rather
    /// than a failure.
    fn parse_response(symbol: &str, body: &str) -> Result<Vec<Observation>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = match resp.chart.result {
            Some(result) => result,
            None => {
                return match resp.chart.error {
                    Some(err) if err.code == "Not Found" => Ok(Vec::new()),
                    Some(err) => Err(DataError::ResponseFormatChanged(format!(
                        "{}: {}",
                        err.code, err.description
                    ))),
                    None => Err(DataError::ResponseFormatChanged(
                        "empty result with no error".into(),
                    )),
                };
            }
        };

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?
            .close;

        let calendar = Calendar::from_meta(data.meta);

        let mut rows = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            // Null closes are holiday and placeholder rows
            let Some(close) = closes.get(i).copied().flatten() else {
                continue;
            };

            let date = calendar.session_date(ts).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            rows.push(Observation::new(date, close));
        }

        Ok(rows)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_history(
        &self,
        symbol: &str,
        start: NaiveDate,
    ) -> Result<Vec<Observation>, DataError> {
        let url = Self::chart_url(symbol, start, chrono::Utc::now().timestamp())?;
        debug!(%symbol, %url, "requesting chart");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let rows = Self::interpret(status, symbol, &body)?;
        debug!(%symbol, %status, rows = rows.len(), "chart parsed");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn url_carries_symbol_as_one_path_segment() {
        let url = YahooProvider::chart_url("^GSPC", date(1970, 1, 2), 1_700_000_000).unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/^GSPC");
        assert_eq!(
            url.query(),
            Some("period1=86400&period2=1700000000&interval=1d&events=history")
        );

        let url = YahooProvider::chart_url("JPY=X", date(1970, 1, 1), 0).unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/JPY=X");

        let url = YahooProvider::chart_url("DX-Y.NYB", date(1970, 1, 1), 0).unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/DX-Y.NYB");
    }

    #[test]
    fn url_escapes_separators_inside_symbol() {
        let url = YahooProvider::chart_url("A/B C", date(1970, 1, 1), 0).unwrap();
        assert_eq!(url.path(), "/v8/finance/chart/A%2FB%20C");
    }

    #[test]
    fn sentinel_start_is_a_negative_timestamp() {
        let url = YahooProvider::chart_url("^TNX", date(1900, 1, 1), 0).unwrap();
        let period1 = url
            .query_pairs()
            .find(|(k, _)| k == "period1")
            .map(|(_, v)| v.into_owned());
        assert_eq!(period1.as_deref(), Some("-2208988800"));
    }

    #[test]
    fn parses_closes_in_order_and_drops_nulls() {
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":-18000,"exchangeTimezoneName":"America/New_York"},
            "timestamp":[1577975400,1578061800,1578321000],
            "indicators":{"quote":[{
                "open":[1.0,2.0,3.0],
                "close":[1.882,null,1.788],
                "volume":[0,0,0]
            }]}
        }],"error":null}}"#;

        let rows = YahooProvider::parse_response("^TNX", body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], Observation::new(date(2020, 1, 2), 1.882));
        assert_eq!(rows[1], Observation::new(date(2020, 1, 6), 1.788));
    }

    #[test]
    fn exchange_zone_dates_summer_bars_from_a_winter_run() {
        // Run in January (gmtoffset 0); the July bar is stamped at BST midnight
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":0,"exchangeTimezoneName":"Europe/London"},
            "timestamp":[1688338800,1704240000],
            "indicators":{"quote":[{"close":[144.6,142.3]}]}
        }],"error":null}}"#;

        let rows = YahooProvider::parse_response("JPY=X", body).unwrap();
        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2023, 7, 3), date(2024, 1, 3)]);
    }

    #[test]
    fn unknown_zone_name_falls_back_to_gmtoffset() {
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":3600,"exchangeTimezoneName":"Mars/Olympus"},
            "timestamp":[1577919600],
            "indicators":{"quote":[{"close":[108.7]}]}
        }],"error":null}}"#;

        let rows = YahooProvider::parse_response("JPY=X", body).unwrap();
        assert_eq!(rows[0].date, date(2020, 1, 2));
    }

    #[test]
    fn gmtoffset_moves_dates_into_exchange_calendar() {
        // 2020-01-01T23:00:00Z is midnight Jan 2 in London
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":3600},
            "timestamp":[1577919600],
            "indicators":{"quote":[{"close":[108.7]}]}
        }],"error":null}}"#;

        let rows = YahooProvider::parse_response("JPY=X", body).unwrap();
        assert_eq!(rows[0].date, date(2020, 1, 2));
    }

    #[test]
    fn not_found_is_an_empty_answer() {
        let body = r#"{"chart":{"result":null,"error":{
            "code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let rows = YahooProvider::parse_response("ZZZZ", body).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_timestamps_is_an_empty_answer() {
        let body = r#"{"chart":{"result":[{
            "meta":{},
            "indicators":{"quote":[{}]}
        }],"error":null}}"#;
        let rows = YahooProvider::parse_response("^IRX", body).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn other_chart_errors_are_failures() {
        let body = r#"{"chart":{"result":null,"error":{
            "code":"Bad Request","description":"Invalid input"}}}"#;
        let err = YahooProvider::parse_response("^TNX", body).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
        assert!(err.to_string().contains("Bad Request"));
    }

    #[test]
    fn garbage_body_is_a_failure() {
        let err = YahooProvider::parse_response("^TNX", "<html>").unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn empty_result_array_is_a_failure() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(YahooProvider::parse_response("^TNX", body).is_err());
    }

    const NOT_FOUND_BODY: &str = r#"{"chart":{"result":null,"error":{
        "code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

    #[test]
    fn http_404_with_not_found_chart_error_is_empty() {
        let rows = YahooProvider::interpret(StatusCode::NOT_FOUND, "ZZZZ", NOT_FOUND_BODY).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn http_404_with_unreadable_body_is_http_error() {
        let err = YahooProvider::interpret(StatusCode::NOT_FOUND, "ZZZZ", "<html>").unwrap_err();
        assert!(matches!(err, DataError::Http { status: 404, ref symbol } if symbol == "ZZZZ"));
    }

    #[test]
    fn server_error_is_http_error_even_with_chart_body() {
        let err = YahooProvider::interpret(StatusCode::INTERNAL_SERVER_ERROR, "^TNX", NOT_FOUND_BODY)
            .unwrap_err();
        assert!(matches!(err, DataError::Http { status: 500, .. }));
    }

    #[test]
    fn success_status_parses_body() {
        let body = r#"{"chart":{"result":[{
            "meta":{"gmtoffset":0},
            "timestamp":[1577923200],
            "indicators":{"quote":[{"close":[3.1]}]}
        }],"error":null}}"#;
        let rows = YahooProvider::interpret(StatusCode::OK, "^IRX", body).unwrap();
        assert_eq!(rows, vec![Observation::new(date(2020, 1, 2), 3.1)]);
    }
}
