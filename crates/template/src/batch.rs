//! Lazy batch filling

use crate::mapping::{ColumnMapping, ResolvedMapping};
use crate::renderer::{FilledDocument, FormFiller};
use crate::schema::Template;
use crate::{FillError, MappingError};
use pdf_core::SourcePdf;
use serde::Serialize;
use spreadsheet::DataRow;
use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that stops a batch between rows
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the row in progress still completes
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of filling one row
#[derive(Debug)]
pub struct RowOutcome {
    /// Position of the row in the source sheet
    pub index: usize,
    pub result: Result<FilledDocument, FillError>,
}

impl RowOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Lazy sequence of per-row outcomes.
///
/// Rows are filled one at a time as the iterator advances. A failed row is
/// reported and iteration carries on with the next one. Cloning a batch
/// whose row source is `Clone` gives an independent rerun.
#[derive(Clone)]
pub struct Batch<'a, I> {
    filler: FormFiller<'a>,
    mapping: ResolvedMapping,
    rows: I,
    cancel: Option<CancelToken>,
    succeeded: usize,
    failed: usize,
    finished: bool,
}

impl<'a, I> Batch<'a, I> {
    /// Stop iterating once `token` is cancelled
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn mapping(&self) -> &ResolvedMapping {
        &self.mapping
    }

    fn finish(&mut self, message: &str) {
        self.finished = true;
        tracing::info!(succeeded = self.succeeded, failed = self.failed, "{message}");
    }
}

impl<'a, I, R> Batch<'a, I>
where
    I: Iterator<Item = R>,
    R: Borrow<DataRow>,
{
    /// Run the remaining rows, keeping only the counts and failure reasons
    pub fn summarize(self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for outcome in self {
            summary.record(&outcome);
        }
        summary
    }
}

impl<'a, I, R> Iterator for Batch<'a, I>
where
    I: Iterator<Item = R>,
    R: Borrow<DataRow>,
{
    type Item = RowOutcome;

    fn next(&mut self) -> Option<RowOutcome> {
        if self.finished {
            return None;
        }
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            self.finish("Batch cancelled");
            return None;
        }
        let Some(row) = self.rows.next() else {
            self.finish("Batch finished");
            return None;
        };

        let row = row.borrow();
        let result = self.filler.fill(row, &self.mapping);
        match &result {
            Ok(_) => self.succeeded += 1,
            Err(e) => {
                self.failed += 1;
                tracing::warn!(row = row.index(), error = %e, "Row failed");
            }
        }

        Some(RowOutcome {
            index: row.index(),
            result,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, self.rows.size_hint().1)
        }
    }
}

impl<'a> FormFiller<'a> {
    /// Fill one document per row with a mapping that is already resolved
    pub fn batch<I>(&self, rows: I, mapping: ResolvedMapping) -> Batch<'a, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: Borrow<DataRow>,
    {
        tracing::info!(
            fields = self.template().len(),
            mapped = mapping.mapped_count(),
            "Starting batch"
        );
        Batch {
            filler: self.clone(),
            mapping,
            rows: rows.into_iter(),
            cancel: None,
            succeeded: 0,
            failed: 0,
            finished: false,
        }
    }

    /// Resolve `mapping` against the template, then fill one document per row.
    ///
    /// A mapping problem fails here, before any row is touched.
    pub fn fill_batch<I>(&self, rows: I, mapping: &ColumnMapping) -> Result<Batch<'a, I::IntoIter>, MappingError>
    where
        I: IntoIterator,
        I::Item: Borrow<DataRow>,
    {
        let resolved = mapping.resolve::<String>(self.template(), None)?;
        Ok(self.batch(rows, resolved))
    }
}

/// Fill one document per row with default options
pub fn fill_batch<'a, I>(
    source: &'a SourcePdf,
    template: &'a Template,
    rows: I,
    mapping: &ColumnMapping,
) -> Result<Batch<'a, I::IntoIter>, MappingError>
where
    I: IntoIterator,
    I::Item: Borrow<DataRow>,
{
    FormFiller::new(source, template).fill_batch(rows, mapping)
}

/// Why a row failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub reason: String,
}

/// Counts and failure reasons for a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<RowFailure>,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: &RowOutcome) {
        match &outcome.result {
            Ok(_) => self.succeeded += 1,
            Err(e) => {
                self.failed += 1;
                self.failures.push(RowFailure {
                    row: outcome.index,
                    field: e.field().map(str::to_string),
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl<'o> Extend<&'o RowOutcome> for BatchSummary {
    fn extend<T: IntoIterator<Item = &'o RowOutcome>>(&mut self, iter: T) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn failure(index: usize) -> RowOutcome {
        RowOutcome {
            index,
            result: Err(FillError::NotANumber {
                field: "Amount".to_string(),
                value: "abc".to_string(),
            }),
        }
    }

    fn success(index: usize) -> RowOutcome {
        RowOutcome {
            index,
            result: Ok(FilledDocument::new(Vec::new(), Vec::new())),
        }
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_summary_records_outcomes() {
        let outcomes = [success(0), failure(1), success(2)];
        let mut summary = BatchSummary::default();
        summary.extend(&outcomes);

        assert_eq!(summary.total(), 3);
        assert_eq!(summary.succeeded, 2);
        assert!(!summary.all_succeeded());
        assert_eq!(
            summary.failures,
            vec![RowFailure {
                row: 1,
                field: Some("Amount".to_string()),
                reason: "Field 'Amount': 'abc' is not a number".to_string(),
            }]
        );
    }

    #[test]
    fn test_summary_serializes() {
        let mut summary = BatchSummary::default();
        summary.record(&failure(4));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["failures"][0]["row"], 4);
        assert_eq!(json["failures"][0]["field"], "Amount");
    }
}
