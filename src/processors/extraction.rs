use crate::error::Result;
use crate::readers::{RowIssue, RowOutcome};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::{info, warn};

/// What happened to the rows of one source during extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub issues: Vec<RowIssue>,
}

impl ExtractionReport {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            ..Self::default()
        }
    }

    pub fn rows_skipped(&self) -> usize {
        self.issues.len()
    }

    fn skip(&mut self, issue: RowIssue) {
        warn!(
            "Skipping {} row at line {}: {} [{}]",
            self.source, issue.line, issue.reason, issue.content
        );
        self.issues.push(issue);
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} rows read, {} kept, {} skipped",
            self.source,
            self.rows_read,
            self.rows_kept,
            self.rows_skipped()
        )
    }
}

/// Feed every decoded row of a source through `map`, in source order.
///
/// Rows that failed to decode, and rows `map` rejects, are logged and
/// recorded in the returned report; extraction always continues.
pub fn extract<R, F>(source: &str, rows: Vec<RowOutcome<R>>, mut map: F) -> ExtractionReport
where
    R: Debug,
    F: FnMut(&R) -> Result<()>,
{
    let mut report = ExtractionReport::new(source);

    for outcome in rows {
        report.rows_read += 1;

        match outcome {
            Ok(row) => match map(&row.record) {
                Ok(()) => report.rows_kept += 1,
                Err(e) => report.skip(RowIssue::new(
                    row.line,
                    format!("{:?}", row.record),
                    e.to_string(),
                )),
            },
            Err(issue) => report.skip(issue),
        }
    }

    info!("{}", report.summary());
    report
}
