//! Two-pass merge pipeline.
//!
//! Pass 1 walks every input sequentially and unifies attribute schemas;
//! the canonical schema is frozen before any row is projected. Pass 2
//! runs one blocking task per readable input, all feeding the shared
//! sink. The passes are never interleaved: correctness depends on the
//! schema being closed first.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use snafu::prelude::*;
use tracing::{info, warn};

use crate::config::{Config, MergeMode};
use crate::error::{MergeError, SchemaSnafu, SinkSnafu};
use crate::schema::{project_row, CanonicalSchema, FileMapping, SchemaRegistry};
use crate::sink::shape::ShapeSink;
use crate::sink::table::TableSink;
use crate::sink::MergeSink;
use crate::source;

/// Outcome of one merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Rows attempted across all files, row-level failures included.
    pub rows_emitted: u64,
    /// Rows whose write was rejected and abandoned.
    pub rows_abandoned: u64,
    /// Files fully streamed into the sink.
    pub files_merged: usize,
    /// Files skipped in either pass.
    pub files_skipped: usize,
    /// Non-fatal per-file problems, in completion order.
    pub warnings: Vec<FileWarning>,
}

/// A non-fatal problem attributed to one input file.
#[derive(Debug, Clone)]
pub struct FileWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Per-file input prepared during pass 1.
struct PlannedFile {
    path: PathBuf,
    mapping: FileMapping,
    label: String,
}

/// What one worker task reports back at the join barrier.
struct FileOutcome {
    path: PathBuf,
    rows: u64,
    rows_abandoned: u64,
    /// Set when the file could not be opened in pass 2.
    skipped: Option<String>,
    warnings: Vec<String>,
}

/// Run a full merge: schema pass, sink creation, concurrent copy pass.
pub async fn run(config: Config) -> Result<MergeReport, MergeError> {
    let mut report = MergeReport::default();

    // Pass 1: sequential schema discovery. Canonical column order
    // depends on it, so this never runs concurrently.
    let mut registry = SchemaRegistry::new();
    let mut planned = Vec::new();
    let total = config.inputs.len();
    for (i, path) in config.inputs.iter().enumerate() {
        info!(
            "Reading fields from {} ({} of {})",
            path.display(),
            i + 1,
            total
        );
        match source::read_local_schema(path) {
            Ok(fields) => {
                let mapping = registry.register(&fields);
                planned.push(PlannedFile {
                    path: path.clone(),
                    mapping,
                    label: source::provenance_label(path),
                });
            }
            Err(e) => {
                warn!("Problem reading {}, skipping: {e}", path.display());
                report.files_skipped += 1;
                report.warnings.push(FileWarning {
                    path: path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    let schema = Arc::new(registry.finalize().context(SchemaSnafu)?);

    // Creating the sink is the last fatal step; nothing is written yet.
    let sink = match config.mode {
        MergeMode::Merge => MergeSink::shape(
            ShapeSink::create(&config.output, config.shape_type, &schema).context(SinkSnafu)?,
        ),
        MergeMode::ExtractAttrs => {
            MergeSink::table(TableSink::create(&config.output, &schema).context(SinkSnafu)?)
        }
    };
    let sink = Arc::new(sink);

    // Pass 2: one blocking task per surviving file, no pool-size cap.
    let files_total = planned.len();
    let files_done = Arc::new(AtomicUsize::new(0));
    let mut tasks = FuturesUnordered::new();
    for file in planned {
        let sink = Arc::clone(&sink);
        let schema = Arc::clone(&schema);
        let files_done = Arc::clone(&files_done);
        tasks.push(tokio::task::spawn_blocking(move || {
            merge_file(file, &sink, &schema, &files_done, files_total)
        }));
    }

    while let Some(joined) = tasks.next().await {
        match joined {
            Ok(outcome) => {
                for message in outcome.warnings {
                    report.warnings.push(FileWarning {
                        path: outcome.path.clone(),
                        message,
                    });
                }
                if let Some(message) = outcome.skipped {
                    warn!("Problem reading {}, skipping: {message}", outcome.path.display());
                    report.files_skipped += 1;
                    report.warnings.push(FileWarning {
                        path: outcome.path,
                        message,
                    });
                } else {
                    report.files_merged += 1;
                    report.rows_abandoned += outcome.rows_abandoned;
                }
            }
            Err(e) => {
                warn!("Worker task failed: {e}");
                report.warnings.push(FileWarning {
                    path: PathBuf::new(),
                    message: format!("worker task failed: {e}"),
                });
            }
        }
    }

    report.rows_emitted = sink.rows_emitted();

    // A failed flush or close is a warning; the rows are already counted.
    match Arc::into_inner(sink) {
        Some(sink) => {
            if let Err(e) = sink.finish() {
                warn!("Failed closing {}: {e}", config.output.display());
                report.warnings.push(FileWarning {
                    path: config.output.clone(),
                    message: e.to_string(),
                });
            }
        }
        None => warn!("Output sink still referenced at finalize"),
    }

    info!(
        "Processed {} rows from {} files",
        report.rows_emitted, report.files_merged
    );
    Ok(report)
}

/// Stream one file's records into the sink. Runs on the blocking pool;
/// everything here is isolated to this file.
fn merge_file(
    file: PlannedFile,
    sink: &MergeSink,
    schema: &CanonicalSchema,
    files_done: &AtomicUsize,
    files_total: usize,
) -> FileOutcome {
    let mut outcome = FileOutcome {
        path: file.path.clone(),
        rows: 0,
        rows_abandoned: 0,
        skipped: None,
        warnings: Vec::new(),
    };

    let mut reader = match source::open_shapefile(&file.path) {
        Ok(reader) => reader,
        Err(e) => {
            outcome.skipped = Some(e.to_string());
            return outcome;
        }
    };

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = match result {
            Ok(pair) => pair,
            Err(e) => {
                // A torn record makes the rest of the stream untrustworthy,
                // so this file ends here; rows already written stand.
                warn!("Failed reading record from {}: {e}", file.path.display());
                outcome.warnings.push(format!("record read failed: {e}"));
                break;
            }
        };
        let row = project_row(&record, &file.mapping, schema);
        match sink.emit(shape, row, &file.label) {
            Ok(_) => outcome.rows += 1,
            Err(e) => {
                warn!("Failed writing row from {}, skipping: {e}", file.path.display());
                outcome.rows_abandoned += 1;
            }
        }
    }

    let done = files_done.fetch_add(1, Ordering::Relaxed) + 1;
    info!(
        "Finished {} with {} rows ({done} of {files_total})",
        file.path.display(),
        outcome.rows
    );
    outcome
}
