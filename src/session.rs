//! Browsing state owned by the UI thread.
//!
//! [`Catalog`] is the share → schema → table tree loaded once at startup;
//! [`Session`] tracks the selected table and file and launches projections.

use std::sync::Arc;

use crate::grid::{Generation, Grids, RedrawSignal};
use crate::projector::{spawn_projections, ProjectionRequest, Projections};
use crate::sharing::{File, Result, Schema, Share, SharingClient, Table, TableCoordinate};
use crate::spark_schema::SchemaMap;
use crate::sync::SelectionSync;

#[derive(Clone, Debug, PartialEq)]
pub struct SchemaNode {
    pub schema: Schema,
    pub tables: Vec<Table>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShareNode {
    pub share: Share,
    pub schemas: Vec<SchemaNode>,
}

/// Position of a table in the catalog: (share, schema, table) indices.
pub type CatalogPath = (usize, usize, usize);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub shares: Vec<ShareNode>,
}

impl Catalog {
    /// Walk every share, schema and table the server exposes.
    pub fn load(client: &dyn SharingClient) -> Result<Self> {
        let mut shares = Vec::new();
        for share in client.list_shares()? {
            let mut schemas = Vec::new();
            for schema in client.list_schemas(&share)? {
                let tables = client.list_tables(&schema)?;
                tracing::debug!(share = %share.name, schema = %schema.name, tables = tables.len(), "listed tables");
                schemas.push(SchemaNode { schema, tables });
            }
            shares.push(ShareNode { share, schemas });
        }
        let catalog = Self { shares };
        tracing::info!(
            shares = catalog.shares.len(),
            tables = catalog.table_count(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn table_count(&self) -> usize {
        self.shares
            .iter()
            .flat_map(|s| &s.schemas)
            .map(|s| s.tables.len())
            .sum()
    }

    pub fn share_names(&self) -> Vec<&str> {
        self.shares.iter().map(|s| s.share.name.as_str()).collect()
    }

    pub fn schema_names(&self, share: usize) -> Vec<&str> {
        self.shares
            .get(share)
            .map(|s| s.schemas.iter().map(|s| s.schema.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn table_names(&self, share: usize, schema: usize) -> Vec<&str> {
        self.shares
            .get(share)
            .and_then(|s| s.schemas.get(schema))
            .map(|s| s.tables.iter().map(|t| t.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn table(&self, (share, schema, table): CatalogPath) -> Option<&Table> {
        self.shares
            .get(share)?
            .schemas
            .get(schema)?
            .tables
            .get(table)
    }

    pub fn locate(&self, coordinate: &TableCoordinate) -> Option<CatalogPath> {
        let share = self
            .shares
            .iter()
            .position(|s| s.share.name == coordinate.share)?;
        let schemas = &self.shares[share].schemas;
        let schema = schemas
            .iter()
            .position(|s| s.schema.name == coordinate.schema)?;
        let table = schemas[schema]
            .tables
            .iter()
            .position(|t| t.name == coordinate.table)?;
        Some((share, schema, table))
    }
}

pub struct Session {
    client: Arc<dyn SharingClient>,
    catalog: Catalog,
    grids: Grids,
    generation: Generation,
    redraw: RedrawSignal,
    schema: SchemaMap,
    files: Vec<File>,
    table: Option<Table>,
    file: Option<String>,
    _sync: SelectionSync,
}

impl Session {
    pub fn new(client: Arc<dyn SharingClient>, catalog: Catalog) -> Self {
        let grids = Grids::new();
        let sync = SelectionSync::wire(&grids.data, &grids.stats, &grids.schema);
        Self {
            client,
            catalog,
            grids,
            generation: Generation::new(),
            redraw: RedrawSignal::new(),
            schema: SchemaMap::new(),
            files: Vec::new(),
            table: None,
            file: None,
            _sync: sync,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn grids(&self) -> &Grids {
        &self.grids
    }

    pub fn redraw(&self) -> &RedrawSignal {
        &self.redraw
    }

    pub fn schema(&self) -> &SchemaMap {
        &self.schema
    }

    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    pub fn selected_file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Title of the file list for the current table.
    pub fn files_title(&self) -> String {
        match &self.table {
            Some(table) => format!("Files in table: {}", table.name),
            None => "Files".to_string(),
        }
    }

    /// Make `table` current: list its files and reload the schema map.
    ///
    /// On error the previous table, files and schema stay in place.
    pub fn select_table(&mut self, table: &Table) -> Result<&[File]> {
        let file_set = self.client.list_files_in_table(table)?;
        let spark = file_set.metadata.spark_schema()?;

        self.generation.advance();
        self.grids.data.clear();
        self.redraw.request();
        self.schema.replace_with(&spark);
        self.files = file_set.add_files;
        self.table = Some(table.clone());
        self.file = None;
        tracing::info!(
            table = %table.coordinate(),
            files = self.files.len(),
            columns = self.schema.len(),
            "table selected"
        );
        Ok(&self.files)
    }

    /// Launch the data, stats and schema projections for file `id` of the
    /// current table. `None` when no table is selected or the id is unknown.
    pub fn select_file(&mut self, id: &str) -> Option<Projections> {
        let table = self.table.clone()?;
        let file = self.files.iter().find(|f| f.id == id)?.clone();

        let ticket = self.generation.advance();
        self.file = Some(file.id.clone());
        self.grids
            .data
            .set_title(format!("Data from file:{} from table:{}", file.id, table.name));
        self.grids.data.clear();
        self.grids.stats.clear();
        self.redraw.request();
        tracing::info!(table = %table.coordinate(), file = %file.id, epoch = ticket.epoch(), "file selected");

        Some(spawn_projections(ProjectionRequest {
            client: Arc::clone(&self.client),
            table,
            file,
            schema: self.schema.clone(),
            grids: self.grids.clone(),
            ticket,
            redraw: self.redraw.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing::{FileSet, SharingError};
    use arrow::record_batch::RecordBatch;

    struct Tree;

    impl SharingClient for Tree {
        fn list_shares(&self) -> Result<Vec<Share>> {
            Ok(vec![share("a"), share("b")])
        }
        fn list_schemas(&self, share: &Share) -> Result<Vec<Schema>> {
            Ok(vec![Schema {
                name: format!("{}_default", share.name),
                share: share.name.clone(),
            }])
        }
        fn list_tables(&self, schema: &Schema) -> Result<Vec<Table>> {
            Ok(["t1", "t2"]
                .iter()
                .map(|name| Table {
                    name: name.to_string(),
                    schema: schema.name.clone(),
                    share: schema.share.clone(),
                    share_id: None,
                    id: None,
                })
                .collect())
        }
        fn list_files_in_table(&self, table: &Table) -> Result<FileSet> {
            Err(SharingError::FileNotFound {
                id: "*".into(),
                table: table.coordinate(),
            })
        }
        fn load_table(&self, table: &Table, file_id: &str) -> Result<RecordBatch> {
            Err(SharingError::FileNotFound {
                id: file_id.into(),
                table: table.coordinate(),
            })
        }
    }

    fn share(name: &str) -> Share {
        Share {
            name: name.into(),
            id: None,
        }
    }

    #[test]
    fn catalog_is_hierarchical() {
        let catalog = Catalog::load(&Tree).unwrap();
        assert_eq!(catalog.share_names(), ["a", "b"]);
        assert_eq!(catalog.schema_names(1), ["b_default"]);
        assert_eq!(catalog.table_names(1, 0), ["t1", "t2"]);
        assert_eq!(catalog.table_count(), 4);
        assert!(catalog.schema_names(7).is_empty());
    }

    #[test]
    fn locate_finds_coordinates() {
        let catalog = Catalog::load(&Tree).unwrap();
        let coordinate = TableCoordinate::parse("b.b_default.t2").unwrap();
        let path = catalog.locate(&coordinate).unwrap();
        assert_eq!(path, (1, 0, 1));
        assert_eq!(catalog.table(path).unwrap().coordinate(), "b.b_default.t2");

        let missing = TableCoordinate::parse("b.b_default.nope").unwrap();
        assert_eq!(catalog.locate(&missing), None);
    }

    #[test]
    fn failed_table_selection_keeps_previous_state() {
        let catalog = Catalog::load(&Tree).unwrap();
        let table = catalog.table((0, 0, 0)).unwrap().clone();
        let mut session = Session::new(Arc::new(Tree), catalog);

        assert!(session.select_table(&table).is_err());
        assert!(session.table().is_none());
        assert!(session.files().is_empty());
        assert_eq!(session.files_title(), "Files");
    }

    #[test]
    fn file_selection_needs_a_table() {
        let mut session = Session::new(Arc::new(Tree), Catalog::default());
        assert!(session.select_file("f1").is_none());
    }
}
