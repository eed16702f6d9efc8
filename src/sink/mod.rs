//! Output sinks.
//!
//! Every worker shares one [`MergeSink`]. All output I/O goes through a
//! single critical section so one row's geometry and attributes land as
//! a unit; the row cursor is the only other shared state and advances
//! exactly once per attempted row.

pub mod shape;
pub mod table;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use shapefile::Shape;
use tracing::info;

use crate::error::SinkError;
use crate::schema::CanonicalRow;
use shape::ShapeSink;
use table::TableSink;

/// How often, in rows, progress is logged. Advisory only; reads of the
/// cursor may race with increments and be off by a little.
const PROGRESS_EVERY: u64 = 10_000;

/// Monotonic row counter shared by all workers.
///
/// Starts at zero, advances once per attempted row (rejected rows
/// included), is never reset. Its final value is the reported row count.
#[derive(Debug, Default)]
pub struct RowCursor {
    next: AtomicU64,
}

impl RowCursor {
    /// Claim the next row index.
    fn advance(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Number of rows attempted so far.
    pub fn count(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

enum SinkKind {
    Shape(Mutex<ShapeSink>),
    Table(Mutex<TableSink>),
}

/// The single output destination shared by every file worker.
pub struct MergeSink {
    kind: SinkKind,
    cursor: RowCursor,
}

impl MergeSink {
    /// Wrap a merged-shapefile sink.
    pub fn shape(sink: ShapeSink) -> Self {
        Self {
            kind: SinkKind::Shape(Mutex::new(sink)),
            cursor: RowCursor::default(),
        }
    }

    /// Wrap a flattened-table sink.
    pub fn table(sink: TableSink) -> Self {
        Self {
            kind: SinkKind::Table(Mutex::new(sink)),
            cursor: RowCursor::default(),
        }
    }

    /// Write one row, returning its assigned index.
    ///
    /// The write happens inside the critical section as one unit. The
    /// cursor advances whether or not the write succeeded: a rejected
    /// row is logically attempted, then abandoned, never retried.
    pub fn emit(
        &self,
        shape: Shape,
        row: CanonicalRow,
        provenance: &str,
    ) -> Result<u64, SinkError> {
        let result = match &self.kind {
            SinkKind::Shape(sink) => {
                let mut sink = sink.lock().map_err(|_| SinkError::LockPoisoned)?;
                sink.write(shape, row)
            }
            SinkKind::Table(sink) => {
                let mut sink = sink.lock().map_err(|_| SinkError::LockPoisoned)?;
                sink.write(row, provenance)
            }
        };
        let index = self.cursor.advance();
        let emitted = index + 1;
        if emitted % PROGRESS_EVERY == 0 {
            info!("Total rows processed: {emitted}");
        }
        result.map(|()| index)
    }

    /// Rows attempted so far.
    pub fn rows_emitted(&self) -> u64 {
        self.cursor.count()
    }

    /// Flush and close the output. Called once, after every worker has
    /// joined; a failure here is reported as a warning, not an abort.
    pub fn finish(self) -> Result<(), SinkError> {
        match self.kind {
            SinkKind::Shape(sink) => sink
                .into_inner()
                .map_err(|_| SinkError::LockPoisoned)?
                .finish(),
            SinkKind::Table(sink) => sink
                .into_inner()
                .map_err(|_| SinkError::LockPoisoned)?
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_assigns_strictly_increasing_indices() {
        let cursor = RowCursor::default();
        assert_eq!(cursor.advance(), 0);
        assert_eq!(cursor.advance(), 1);
        assert_eq!(cursor.advance(), 2);
        assert_eq!(cursor.count(), 3);
    }

    #[test]
    fn test_cursor_is_unique_across_threads() {
        use std::collections::HashSet;
        use std::sync::Arc;

        let cursor = Arc::new(RowCursor::default());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let cursor = Arc::clone(&cursor);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| cursor.advance()).collect::<Vec<u64>>()
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            for index in handle.join().unwrap() {
                assert!(seen.insert(index), "duplicate row index {index}");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(cursor.count(), 1000);
    }
}
