//! Wire types of the Delta Sharing REST protocol.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Result, SharingError};
use crate::spark_schema::{SchemaMap, SparkSchema};
use crate::stats::StatsSummary;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Share {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: String,
    pub share: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    pub schema: String,
    pub share: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Table {
    /// `share.schema.table`, the form used on the command line.
    pub fn coordinate(&self) -> String {
        format!("{}.{}.{}", self.share, self.schema, self.name)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    pub min_reader_version: u32,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Format {
    pub provider: String,
}

/// Table metadata line of a query response.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Format,
    pub schema_string: String,
    #[serde(default)]
    pub partition_columns: Vec<String>,
    #[serde(default)]
    pub configuration: HashMap<String, String>,
}

impl Metadata {
    /// Decode the embedded Spark schema JSON.
    pub fn spark_schema(&self) -> Result<SparkSchema> {
        SparkSchema::from_json(&self.schema_string)
    }
}

/// One data file of a table snapshot.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub url: String,
    pub id: String,
    #[serde(default)]
    pub partition_values: HashMap<String, String>,
    pub size: u64,
    #[serde(default)]
    pub stats: Option<String>,
}

impl File {
    /// Parse the per-column statistics the server attached to this file,
    /// typing numeric values by the table's declared column types.
    pub fn stats(&self, schema: &SchemaMap) -> Result<StatsSummary> {
        match &self.stats {
            Some(raw) => StatsSummary::from_json_with_schema(raw, schema),
            None => Err(SharingError::unsupported(format!(
                "file '{}' carries no statistics",
                self.id
            ))),
        }
    }

    /// Secondary text shown under the file id in the file list.
    pub fn size_caption(&self) -> String {
        let size = self.size as f64;
        format!(
            "Size: {:.2} mb ({:.2} kb, {:.0} bytes)",
            size / (1u64 << 20) as f64,
            size / (1u64 << 10) as f64,
            size
        )
    }
}

/// Everything a table query returns: the metadata plus the files to read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileSet {
    pub protocol: Protocol,
    pub metadata: Metadata,
    pub add_files: Vec<File>,
}

impl FileSet {
    pub fn file(&self, id: &str) -> Option<&File> {
        self.add_files.iter().find(|f| f.id == id)
    }
}
