// src/lib.rs
// Modules shared by the binary and the integration tests
pub mod config;
pub mod format;
pub mod grid;
pub mod logging;
pub mod projector;
pub mod session;
pub mod sharing;
pub mod spark_schema;
pub mod stats;
pub mod sync;

pub use grid::{DisplayGrid, GridCell, GridFrame, RedrawSignal, SelectionCursor};
pub use projector::{Outcome, Projections};
pub use session::{Catalog, Session};
pub use sharing::{SharingClient, SharingError};
pub use spark_schema::{SchemaEntry, SchemaMap};
pub use stats::{StatValue, StatsSummary};
