//! Client side of the Delta Sharing protocol.
//!
//! The browser only ever talks to a [`SharingClient`]; [`rest::RestClient`]
//! is the production implementation, tests plug in in-memory ones.

mod error;
pub mod model;
pub mod profile;
pub mod rest;

use arrow::record_batch::RecordBatch;

pub use error::{Result, SharingError};
pub use model::{File, FileSet, Metadata, Schema, Share, Table};
pub use profile::{Profile, ProfileLocator, TableCoordinate};
pub use rest::{ClientOptions, RestClient};

/// Everything the browser needs from a sharing server.
///
/// Implementations are shared between the UI thread and the projector
/// threads, hence `Send + Sync`.
pub trait SharingClient: Send + Sync {
    fn list_shares(&self) -> Result<Vec<Share>>;

    fn list_schemas(&self, share: &Share) -> Result<Vec<Schema>>;

    fn list_tables(&self, schema: &Schema) -> Result<Vec<Table>>;

    /// Current snapshot of a table: metadata plus its data files.
    fn list_files_in_table(&self, table: &Table) -> Result<FileSet>;

    /// Fetch one data file and decode its first record batch.
    fn load_table(&self, table: &Table, file_id: &str) -> Result<RecordBatch>;
}
