//! Import metrics.
//!
//! Emitted through the `metrics` facade; nothing is recorded unless the
//! embedding program installs a recorder.

use std::time::Duration;

use crate::error::ImportError;
use crate::schema::Relation;
use crate::store::FileReport;

/// Rows committed, labelled by relation
pub const ROWS_IMPORTED_TOTAL: &str = "ether_dash_rows_imported_total";
/// Duplicate-key rows discarded, labelled by relation
pub const DUPLICATES_DROPPED_TOTAL: &str = "ether_dash_duplicates_dropped_total";
/// Seconds spent importing one file, labelled by relation
pub const FILE_IMPORT_DURATION: &str = "ether_dash_file_import_duration_seconds";
/// Failed rebuild steps, labelled by relation and error kind
pub const IMPORT_FAILURES_TOTAL: &str = "ether_dash_import_failures_total";

/// Record the outcome of one committed file
pub fn record_file_import(report: &FileReport) {
    let relation = report.relation.table();
    ::metrics::counter!(ROWS_IMPORTED_TOTAL, "relation" => relation)
        .increment(report.rows_inserted as u64);
    ::metrics::counter!(DUPLICATES_DROPPED_TOTAL, "relation" => relation)
        .increment(report.duplicates_dropped as u64);
    let duration = Duration::from_millis(u64::try_from(report.duration_ms).unwrap_or(u64::MAX));
    ::metrics::histogram!(FILE_IMPORT_DURATION, "relation" => relation).record(duration.as_secs_f64());
}

/// Record a failure that aborted the rebuild
pub fn record_failure(relation: Relation, error: &ImportError) {
    ::metrics::counter!(
        IMPORT_FAILURES_TOTAL,
        "relation" => relation.table(),
        "kind" => error.kind()
    )
    .increment(1);
}
