//! One full run: download every indicator, then derive the spread.

use crate::config::RunConfig;
use crate::data::download::{fetch_all, FetchReport};
use crate::data::progress::FetchProgress;
use crate::data::provider::DataProvider;
use crate::data::series::SeriesStore;
use crate::spread::{derive_spread, SpreadOutcome};
use tracing::info;

/// What a run produced, unit by unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub fetch: FetchReport,
    /// `None` when the config has no spread.
    pub spread: Option<SpreadOutcome>,
}

impl RunReport {
    /// True if every indicator was saved and the spread (if any) was written.
    pub fn fully_succeeded(&self) -> bool {
        self.fetch.all_saved()
            && !matches!(self.spread, Some(SpreadOutcome::Failed(_)))
    }
}

/// Run the download loop to completion, then the spread step.
///
/// Never fails: every problem is confined to the indicator or step it
/// happened in and reported through `progress` and the returned report.
pub fn run(
    config: &RunConfig,
    provider: &dyn DataProvider,
    progress: &dyn FetchProgress,
) -> RunReport {
    let store = SeriesStore::new(&config.dest_dir);

    let fetch = fetch_all(provider, &store, &config.indicators, config.start, progress);
    let spread = config
        .spread
        .as_ref()
        .map(|spec| derive_spread(&store, spec, progress));

    info!(
        saved = fetch.saved(),
        no_data = fetch.no_data(),
        failed = fetch.failed(),
        spread_ok = matches!(spread, Some(SpreadOutcome::Saved { .. })),
        "run finished"
    );

    RunReport { fetch, spread }
}
