//! Collects configuration errors so toolchain loading can report every
//! problem in one pass instead of stopping at the first.

use anyhow::Result;
use colored::Colorize;

/// For re-throwing after the full list of load errors has been reported.
#[derive(Debug, thiserror::Error)]
#[error("{0} failed due to {1} errors")]
pub struct AggregatedErrors(pub String, pub usize);

#[derive(Default)]
pub struct Errors {
    errors: Vec<anyhow::Error>,
}

impl Errors {
    pub fn add(&mut self, e: anyhow::Error) {
        log::trace!("error: {e:?}");
        self.errors.push(e);
    }

    /// Attach `msg` as context before collecting the error.
    pub fn add_context(&mut self, e: anyhow::Error, msg: String) {
        self.add(e.context(msg));
    }

    /// Log the full error list, then fail with an aggregate error if
    /// there were one or more errors.
    pub fn into_result(self, label: &str) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        for e in &self.errors {
            log::error!("{}: {e:#}", "invalid toolchain configuration".red());
        }
        Err(AggregatedErrors(label.to_owned(), self.errors.len()).into())
    }
}
