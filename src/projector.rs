//! The three projector tasks launched on every file selection.
//!
//! Each task runs on its own thread, publishes one [`GridFrame`] into its
//! grid, requests a redraw and reports an [`Outcome`] on a one-shot channel.
//! A task always reports, even when its collaborator call fails.

use std::fmt;
use std::sync::Arc;
use std::thread;

use arrow::record_batch::RecordBatch;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::format::{cell_attrs, format_value};
use crate::grid::{CellAttrs, DisplayGrid, GridCell, GridFrame, Grids, RedrawSignal, Ticket};
use crate::sharing::{File, SharingClient, Table};
use crate::spark_schema::{project_schema, SchemaMap};
use crate::stats::project_stats;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionKind {
    Data,
    Stats,
    Schema,
}

impl fmt::Display for ProjectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Data => "data",
            Self::Stats => "stats",
            Self::Schema => "schema",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Frame published; `rows` data rows below the header.
    Rendered { rows: usize },
    /// Collaborator failed; the grid was left empty.
    Failed(String),
    /// A newer selection superseded this task; nothing was written.
    Stale,
}

/// Receive-once completion signal of one projector task.
pub struct Completion {
    kind: ProjectionKind,
    rx: oneshot::Receiver<Outcome>,
}

impl Completion {
    pub fn kind(&self) -> ProjectionKind {
        self.kind
    }

    /// Block until the task reports.
    pub fn wait(self) -> Outcome {
        self.rx.blocking_recv().unwrap_or_else(|_| lost(self.kind))
    }

    /// Non-blocking check, for the UI loop. `Some` at most once.
    pub fn poll(&mut self) -> Option<Outcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(lost(self.kind)),
        }
    }
}

fn lost(kind: ProjectionKind) -> Outcome {
    Outcome::Failed(format!("{kind} projector exited without reporting"))
}

/// Completions of one file selection.
pub struct Projections {
    pub data: Completion,
    pub stats: Completion,
    pub schema: Completion,
}

impl Projections {
    /// Wait for all three, in data, stats, schema order.
    pub fn wait_all(self) -> [Outcome; 3] {
        [self.data.wait(), self.stats.wait(), self.schema.wait()]
    }

    pub fn into_vec(self) -> Vec<Completion> {
        vec![self.data, self.stats, self.schema]
    }
}

/// Owned context for one file selection's projector tasks.
pub struct ProjectionRequest {
    pub client: Arc<dyn SharingClient>,
    pub table: Table,
    pub file: File,
    /// Snapshot of the session's schema map at launch time.
    pub schema: SchemaMap,
    pub grids: Grids,
    pub ticket: Ticket,
    pub redraw: RedrawSignal,
}

/// Launch the data, stats and schema projectors without waiting on any.
pub fn spawn_projections(request: ProjectionRequest) -> Projections {
    let ProjectionRequest {
        client,
        table,
        file,
        schema,
        grids,
        ticket,
        redraw,
    } = request;

    let data = {
        let (table, file_id) = (table.clone(), file.id.clone());
        let (grid, ticket, redraw) = (grids.data.clone(), ticket.clone(), redraw.clone());
        spawn(ProjectionKind::Data, move || {
            render_data(client.as_ref(), &table, &file_id, &grid, &ticket, &redraw)
        })
    };

    let stats = {
        let (grid, ticket, redraw) = (grids.stats.clone(), ticket.clone(), redraw.clone());
        let schema = schema.clone();
        spawn(ProjectionKind::Stats, move || {
            render_stats(&file, &schema, &grid, &ticket, &redraw)
        })
    };

    let schema = {
        let grid = grids.schema.clone();
        let table_name = table.name;
        spawn(ProjectionKind::Schema, move || {
            render_schema(&schema, &table_name, &grid, &ticket, &redraw)
        })
    };

    Projections {
        data,
        stats,
        schema,
    }
}

fn spawn(kind: ProjectionKind, task: impl FnOnce() -> Outcome + Send + 'static) -> Completion {
    let (tx, rx) = oneshot::channel();
    let spawned = thread::Builder::new()
        .name(format!("project-{kind}"))
        .spawn(move || {
            let outcome = task();
            tracing::debug!(%kind, ?outcome, "projection finished");
            let _ = tx.send(outcome);
        });
    if let Err(e) = spawned {
        // the closure, and with it the sender, is dropped: poll/wait see `Failed`
        tracing::error!(%kind, error = %e, "could not spawn projector thread");
    }
    Completion { kind, rx }
}

/// Header from the field names, one row per batch row, columns in batch order.
pub fn project_batch(batch: &RecordBatch) -> GridFrame {
    let schema = batch.schema();
    let header = schema
        .fields()
        .iter()
        .map(|f| GridCell::header(f.name().as_str()))
        .collect();
    let attrs: Vec<CellAttrs> = schema
        .fields()
        .iter()
        .map(|f| cell_attrs(f.data_type()))
        .collect();

    let rows = (0..batch.num_rows())
        .map(|row| {
            batch
                .columns()
                .iter()
                .zip(&attrs)
                .map(|(column, attrs)| {
                    format_value(column.as_ref(), row).map(|text| GridCell::new(text, *attrs))
                })
                .collect()
        })
        .collect();

    GridFrame {
        title: None,
        header,
        rows,
    }
}

pub fn render_data(
    client: &dyn SharingClient,
    table: &Table,
    file_id: &str,
    grid: &DisplayGrid,
    ticket: &Ticket,
    redraw: &RedrawSignal,
) -> Outcome {
    match client.load_table(table, file_id) {
        Ok(batch) => finish(grid, ticket, project_batch(&batch), redraw),
        Err(e) => fail(ProjectionKind::Data, grid, ticket, redraw, e.to_string()),
    }
}

pub fn render_stats(
    file: &File,
    schema: &SchemaMap,
    grid: &DisplayGrid,
    ticket: &Ticket,
    redraw: &RedrawSignal,
) -> Outcome {
    match file.stats(schema) {
        Ok(summary) => finish(grid, ticket, project_stats(&summary, &file.id), redraw),
        Err(e) => fail(ProjectionKind::Stats, grid, ticket, redraw, e.to_string()),
    }
}

pub fn render_schema(
    schema: &SchemaMap,
    table_name: &str,
    grid: &DisplayGrid,
    ticket: &Ticket,
    redraw: &RedrawSignal,
) -> Outcome {
    finish(grid, ticket, project_schema(schema, table_name), redraw)
}

fn finish(
    grid: &DisplayGrid,
    ticket: &Ticket,
    frame: GridFrame,
    redraw: &RedrawSignal,
) -> Outcome {
    let rows = frame.rows.len();
    let published = grid.publish(ticket, frame);
    redraw.request();
    if published {
        Outcome::Rendered { rows }
    } else {
        Outcome::Stale
    }
}

fn fail(
    kind: ProjectionKind,
    grid: &DisplayGrid,
    ticket: &Ticket,
    redraw: &RedrawSignal,
    message: String,
) -> Outcome {
    tracing::warn!(%kind, grid = grid.name(), error = %message, "projection failed");
    let published = grid.publish(ticket, GridFrame::empty());
    redraw.request();
    if published {
        Outcome::Failed(message)
    } else {
        Outcome::Stale
    }
}
