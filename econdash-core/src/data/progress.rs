//! Console notices for the fetch loop and the spread step.
//!
//! Notices are for humans. The shapes are fixed so an operator skimming a cron
//! mail can tell the four outcomes apart at a glance.

use std::fmt;
use std::path::Path;

/// Progress callback for a full run.
pub trait FetchProgress {
    /// Called before a provider request is made.
    fn on_start(&self, name: &str, index: usize, total: usize);

    /// Called after a series file has been written.
    fn on_saved(&self, name: &str, path: &Path, rows: usize);

    /// Called when the provider returned zero rows.
    fn on_no_data(&self, name: &str);

    /// Called when any step for one indicator failed.
    fn on_failed(&self, name: &str, detail: &str);

    /// Called after the derived spread has been written.
    fn on_spread_saved(&self, name: &str, path: &Path, rows: usize);

    /// Called when the spread step failed as a whole.
    fn on_spread_failed(&self, name: &str, detail: &str);

    /// Called once the fetch loop has visited every indicator.
    fn on_batch_complete(&self, saved: usize, no_data: usize, failed: usize);
}

/// One console line. `Display` renders the fixed shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notice<'a> {
    Start { name: &'a str },
    Saved { name: &'a str, path: &'a Path, rows: usize },
    NoData { name: &'a str },
    Failed { name: &'a str, detail: &'a str },
    SpreadSaved { name: &'a str, path: &'a Path, rows: usize },
    BatchComplete { saved: usize, no_data: usize, failed: usize },
}

impl fmt::Display for Notice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Notice::Start { name } => write!(f, "⏳ Downloading {name}..."),
            Notice::Saved { name, path, rows } => write!(
                f,
                "✅ {name} saved successfully: {} ({rows} rows)",
                path.display()
            ),
            Notice::NoData { name } => write!(f, "❗ {name}: No data available."),
            Notice::Failed { name, detail } => write!(f, "❌ {name} error: {detail}"),
            Notice::SpreadSaved { name, path, rows } => {
                write!(f, "✅ {name} saved: {} ({rows} rows)", path.display())
            }
            Notice::BatchComplete {
                saved,
                no_data,
                failed,
            } => write!(f, "Done: {saved} saved, {no_data} empty, {failed} failed"),
        }
    }
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, name: &str, _index: usize, _total: usize) {
        println!("{}", Notice::Start { name });
    }

    fn on_saved(&self, name: &str, path: &Path, rows: usize) {
        println!("{}", Notice::Saved { name, path, rows });
    }

    fn on_no_data(&self, name: &str) {
        println!("{}", Notice::NoData { name });
    }

    fn on_failed(&self, name: &str, detail: &str) {
        println!("{}", Notice::Failed { name, detail });
    }

    fn on_spread_saved(&self, name: &str, path: &Path, rows: usize) {
        println!("{}", Notice::SpreadSaved { name, path, rows });
    }

    fn on_spread_failed(&self, name: &str, detail: &str) {
        println!("{}", Notice::Failed { name, detail });
    }

    fn on_batch_complete(&self, saved: usize, no_data: usize, failed: usize) {
        println!(
            "{}",
            Notice::BatchComplete {
                saved,
                no_data,
                failed
            }
        );
    }
}
