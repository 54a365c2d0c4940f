//! Declared table schema (Spark JSON) and its grid projection.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::grid::{CellAttrs, GridCell, GridFrame};
use crate::sharing::Result;

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SparkSchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub fields: Vec<SparkField>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SparkField {
    pub name: String,
    /// Primitive types are plain strings, nested types are objects.
    #[serde(rename = "type")]
    pub data_type: Value,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub metadata: Value,
}

impl SparkSchema {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl SparkField {
    pub fn type_name(&self) -> String {
        match &self.data_type {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn metadata_text(&self) -> String {
        match &self.metadata {
            Value::Null => "{}".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    pub data_type: String,
    pub nullable: bool,
    pub metadata: String,
}

/// Column name → declared type, nullability and metadata of the
/// currently selected table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaMap {
    entries: HashMap<String, SchemaEntry>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_spark(schema: &SparkSchema) -> Self {
        let mut map = Self::new();
        map.replace_with(schema);
        map
    }

    /// Drop every entry, then load the fields of `schema`.
    pub fn replace_with(&mut self, schema: &SparkSchema) {
        self.entries.clear();
        for field in &schema.fields {
            self.entries.insert(
                field.name.clone(),
                SchemaEntry {
                    data_type: field.type_name(),
                    nullable: field.nullable,
                    metadata: field.metadata_text(),
                },
            );
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: SchemaEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.get(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

/// Build the `Column | Type | Nullable | Metadata` grid.
pub fn project_schema(map: &SchemaMap, table: &str) -> GridFrame {
    let plain = CellAttrs::default().expansion(2);
    let header = ["Column", "Type", "Nullable", "Metadata"]
        .into_iter()
        .map(GridCell::header)
        .collect();

    let rows = map
        .sorted_keys()
        .into_iter()
        .filter_map(|key| map.get(key).map(|entry| (key, entry)))
        .map(|(key, entry)| {
            vec![
                Some(GridCell::new(key, plain.bold())),
                Some(GridCell::new(entry.data_type.as_str(), plain)),
                Some(GridCell::new(entry.nullable.to_string(), plain)),
                Some(GridCell::new(entry.metadata.as_str(), plain)),
            ]
        })
        .collect();

    GridFrame {
        title: Some(format!("Schema for table: {table}")),
        header,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "type": "struct",
        "fields": [
            {"name": "b", "type": "double", "nullable": true, "metadata": {}},
            {"name": "a", "type": "string", "nullable": false, "metadata": {"comment": "key"}},
            {"name": "c", "type": {"type": "array", "elementType": "long", "containsNull": true},
             "nullable": true, "metadata": {}}
        ]
    }"#;

    #[test]
    fn rows_sorted_by_column_key() {
        let map = SchemaMap::from_spark(&SparkSchema::from_json(SCHEMA).unwrap());
        let frame = project_schema(&map, "boston");
        let keys: Vec<String> = (0..frame.rows.len())
            .map(|r| frame.row_texts(r)[0].clone())
            .collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn nullable_and_metadata_rendering() {
        let map = SchemaMap::from_spark(&SparkSchema::from_json(SCHEMA).unwrap());
        let frame = project_schema(&map, "boston");
        assert_eq!(
            frame.row_texts(0),
            ["a", "string", "false", r#"{"comment":"key"}"#]
        );
        assert_eq!(frame.row_texts(1), ["b", "double", "true", "{}"]);
        assert!(frame.row_texts(2)[1].contains("\"elementType\":\"long\""));
        assert_eq!(frame.title.as_deref(), Some("Schema for table: boston"));
    }

    #[test]
    fn replace_clears_previous_entries() {
        let mut map = SchemaMap::from_spark(&SparkSchema::from_json(SCHEMA).unwrap());
        let other = SparkSchema::from_json(
            r#"{"type":"struct","fields":[{"name":"z","type":"integer","nullable":true,"metadata":{}}]}"#,
        )
        .unwrap();
        map.replace_with(&other);
        assert_eq!(map.sorted_keys(), ["z"]);
    }

    #[test]
    fn header_is_bold_and_not_selectable() {
        let frame = project_schema(&SchemaMap::new(), "t");
        assert_eq!(frame.header.len(), 4);
        assert!(frame.header.iter().all(|c| c.attrs.bold && !c.attrs.selectable));
        assert!(frame.rows.is_empty());
    }
}
