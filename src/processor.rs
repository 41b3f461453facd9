//! Event batch processing.
//!
//! Every row event in a sheet-scoped batch is turned into a [`RowForward`] and
//! handed to the forwarder. Deletions are forwarded as-is. Every other event
//! type fetches the row and renders its cells, at most once per
//! (row id, version) within the batch.

use crate::client::SheetApi;
use crate::forward::RowForwarder;
use crate::types::{CallbackBatch, Cell, RowForward, RowId, SheetId};
use std::collections::HashSet;
use std::fmt;

/// Payload sent for deleted rows, which can no longer be fetched.
pub const DELETED_PAYLOAD: &str = "output";

/// Identifies one logical row change: `<row id>_<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    row_id: RowId,
    version: Option<i64>,
}

impl DedupKey {
    pub fn new(row_id: RowId, version: Option<i64>) -> Self {
        Self { row_id, version }
    }
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(v) => write!(f, "{}_{}", self.row_id, v),
            None => write!(f, "{}_", self.row_id),
        }
    }
}

/// Keys already dispatched in the current delivery.
#[derive(Debug, Default)]
pub struct ProcessedEvents {
    seen: HashSet<DedupKey>,
}

impl ProcessedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the key was already present.
    pub fn mark(&mut self, key: DedupKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Counts for one processed batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub forwarded: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Process one callback batch.
///
/// `default_sheet` is used when the batch does not name its sheet.
pub async fn process_events(
    batch: &CallbackBatch,
    processed: &mut ProcessedEvents,
    api: &dyn SheetApi,
    forwarder: &dyn RowForwarder,
    default_sheet: SheetId,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    if batch.scope.as_deref() != Some("sheet") {
        tracing::debug!(scope = ?batch.scope, "ignoring batch that is not sheet-scoped");
        summary.skipped = batch.events.len();
        return summary;
    }
    let sheet_id = batch.scope_object_id.unwrap_or(default_sheet);

    for event in &batch.events {
        let row_id = match (event.object_type.as_str(), event.id) {
            ("row", Some(id)) => id,
            ("row", None) => {
                tracing::warn!(event_type = %event.event_type, "row event without an id");
                summary.skipped += 1;
                continue;
            }
            _ => {
                summary.skipped += 1;
                continue;
            }
        };
        tracing::info!(event_type = %event.event_type, row_id, "Row event");

        let record = if event.event_type == "deleted" {
            RowForward {
                event_type: event.event_type.clone(),
                row_id,
                payload: DELETED_PAYLOAD.to_string(),
            }
        } else {
            let key = DedupKey::new(row_id, event.version);
            if !processed.mark(key.clone()) {
                tracing::debug!(%key, "skipping duplicate event");
                summary.duplicates += 1;
                continue;
            }

            match api.get_row(sheet_id, row_id).await {
                Ok(row) => RowForward {
                    event_type: event.event_type.clone(),
                    row_id,
                    payload: format_row(&row.cells, row_id),
                },
                Err(e) => {
                    tracing::error!(sheet_id, row_id, "Error fetching row: {e}");
                    summary.failed += 1;
                    continue;
                }
            }
        };

        match forwarder.forward(record).await {
            Ok(()) => summary.forwarded += 1,
            Err(e) => {
                tracing::error!(row_id, "Error forwarding row: {e}");
                summary.failed += 1;
            }
        }
    }

    summary
}

/// `'v1', 'v2', ..., <row id>`
pub fn format_row(cells: &[Cell], row_id: RowId) -> String {
    cells
        .iter()
        .map(|cell| format!("'{}'", cell_text(cell.value.as_ref())))
        .chain(std::iter::once(row_id.to_string()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn cell_text(value: Option<&serde_json::Value>) -> String {
    match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
