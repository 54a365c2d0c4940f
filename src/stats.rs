//! Per-file column statistics and their grid projection.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::format::format_float;
use crate::grid::{Align, CellAttrs, GridCell, GridFrame};
use crate::sharing::Result;
use crate::spark_schema::SchemaMap;

/// Largest magnitude an `f64` holds without losing integer precision.
const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

/// A min/max statistic. Floats render with two decimals, integers plain.
#[derive(Clone, Debug, PartialEq)]
pub enum StatValue {
    String(String),
    Float32(f32),
    Float64(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
}

impl StatValue {
    /// Untyped decoding: every JSON number is a `Float64`.
    /// Booleans, objects, arrays and nulls have no statistic form.
    pub fn from_json(value: &Value) -> Option<Self> {
        Self::from_json_as(value, None)
    }

    /// Decode a number by the column's declared Spark type (`short`,
    /// `integer`, `long`, `float`, ...). Unknown or absent types, and
    /// integers that do not fit, fall back to `Float64`.
    pub fn from_json_as(value: &Value, declared: Option<&str>) -> Option<Self> {
        let n = match value {
            Value::String(s) => return Some(Self::String(s.clone())),
            Value::Number(n) => n,
            _ => return None,
        };
        let float = n.as_f64()?;
        let exact = float.fract() == 0.0 && float.abs() < MAX_EXACT;
        let integral = n.as_i64().or_else(|| exact.then_some(float as i64));
        let typed = match (declared, integral) {
            (Some("byte" | "short"), Some(i)) => i16::try_from(i).ok().map(Self::Int16),
            (Some("integer"), Some(i)) => i32::try_from(i).ok().map(Self::Int32),
            (Some("long"), Some(i)) => Some(Self::Int64(i)),
            (Some("float"), _) => Some(Self::Float32(float as f32)),
            _ => None,
        };
        Some(typed.unwrap_or(Self::Float64(float)))
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Float32(v) => f.write_str(&format_float(*v as f64)),
            Self::Float64(v) => f.write_str(&format_float(*v)),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
        }
    }
}

/// `None` marks a column whose value is present but has no statistic form;
/// it keeps its row and renders as an empty cell.
pub type StatMap = HashMap<String, Option<StatValue>>;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsSummary {
    pub num_records: u64,
    pub min_values: StatMap,
    pub max_values: StatMap,
    pub null_count: HashMap<String, f64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStats {
    #[serde(default)]
    num_records: u64,
    #[serde(default)]
    min_values: HashMap<String, Value>,
    #[serde(default)]
    max_values: HashMap<String, Value>,
    #[serde(default)]
    null_count: HashMap<String, Value>,
}

fn stat_map(raw: HashMap<String, Value>, schema: Option<&SchemaMap>) -> StatMap {
    raw.into_iter()
        .map(|(k, v)| {
            let declared = schema
                .and_then(|s| s.get(&k))
                .map(|e| e.data_type.as_str());
            let value = StatValue::from_json_as(&v, declared);
            (k, value)
        })
        .collect()
}

impl StatsSummary {
    /// Parse the `stats` JSON string a sharing server attaches to a file.
    pub fn from_json(raw: &str) -> Result<Self> {
        Self::decode(raw, None)
    }

    /// Like [`StatsSummary::from_json`], typing numbers by `schema`.
    pub fn from_json_with_schema(raw: &str, schema: &SchemaMap) -> Result<Self> {
        Self::decode(raw, Some(schema))
    }

    fn decode(raw: &str, schema: Option<&SchemaMap>) -> Result<Self> {
        let raw: RawStats = serde_json::from_str(raw)?;
        Ok(Self {
            num_records: raw.num_records,
            min_values: stat_map(raw.min_values, schema),
            max_values: stat_map(raw.max_values, schema),
            null_count: raw
                .null_count
                .into_iter()
                .filter_map(|(k, v)| v.as_f64().map(|n| (k, n)))
                .collect(),
        })
    }

    /// Column keys in display order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.max_values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

fn stat_text(map: &StatMap, key: &str) -> String {
    map.get(key)
        .and_then(Option::as_ref)
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Build the `Column | Max | Min | #Nulls` grid for one file.
pub fn project_stats(summary: &StatsSummary, file_id: &str) -> GridFrame {
    let value = CellAttrs::default().align(Align::Right).expansion(2);
    let header = vec![
        GridCell::new("Column", CellAttrs::default().not_selectable().expansion(2)),
        GridCell::header("Max"),
        GridCell::header("Min"),
        GridCell::header("#Nulls"),
    ];

    let rows = summary
        .sorted_keys()
        .into_iter()
        .map(|key| {
            let nulls = summary.null_count.get(key).map(|n| format!("{n:.0}"));
            vec![
                Some(GridCell::new(key, CellAttrs::default().bold().expansion(2))),
                Some(GridCell::new(stat_text(&summary.max_values, key), value)),
                Some(GridCell::new(stat_text(&summary.min_values, key), value)),
                Some(GridCell::new(nulls.unwrap_or_default(), value)),
            ]
        })
        .collect();

    GridFrame {
        title: Some(format!(
            "Stats file-id:{file_id}, containing {} rows",
            summary.num_records
        )),
        header,
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spark_schema::SchemaEntry;
    use serde_json::json;

    const STATS: &str = r#"{
        "numRecords": 3,
        "minValues": {"b": 1.5, "a": "apple", "c": 10},
        "maxValues": {"b": 9.126, "a": "pear", "c": 20},
        "nullCount": {"b": 0, "a": 1, "c": 2.0}
    }"#;

    #[test]
    fn rows_sorted_by_column_key() {
        let summary = StatsSummary::from_json(STATS).unwrap();
        let frame = project_stats(&summary, "f1");
        let keys: Vec<String> = (0..frame.rows.len())
            .map(|r| frame.row_texts(r)[0].clone())
            .collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn values_formatted_per_type() {
        let summary = StatsSummary::from_json(STATS).unwrap();
        let frame = project_stats(&summary, "f1");
        assert_eq!(frame.row_texts(0), ["a", "pear", "apple", "1"]);
        assert_eq!(frame.row_texts(1), ["b", "9.13", "1.50", "0"]);
        assert_eq!(frame.row_texts(2), ["c", "20.00", "10.00", "2"]);
    }

    #[test]
    fn header_and_title() {
        let summary = StatsSummary::from_json(STATS).unwrap();
        let frame = project_stats(&summary, "f1");
        let names: Vec<&str> = frame.header.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(names, ["Column", "Max", "Min", "#Nulls"]);
        assert!(!frame.header[0].attrs.bold);
        assert!(frame.header[1].attrs.bold);
        assert!(frame.header.iter().all(|c| !c.attrs.selectable));
        assert_eq!(
            frame.title.as_deref(),
            Some("Stats file-id:f1, containing 3 rows")
        );
    }

    #[test]
    fn narrow_variants_share_the_formatting_table() {
        assert_eq!(StatValue::Float32(0.5).to_string(), "0.50");
        assert_eq!(StatValue::Int16(-3).to_string(), "-3");
        assert_eq!(StatValue::Int32(7).to_string(), "7");
        assert_eq!(StatValue::String("x".into()).to_string(), "x");
    }

    #[test]
    fn untyped_numbers_are_floats() {
        assert_eq!(StatValue::from_json(&json!(5)), Some(StatValue::Float64(5.0)));
        assert_eq!(
            StatValue::from_json(&json!(5.5)),
            Some(StatValue::Float64(5.5))
        );
        assert_eq!(StatValue::from_json(&json!(true)), None);
        assert_eq!(StatValue::from_json(&json!({"nested": 1})), None);
    }

    fn schema_of(columns: &[(&str, &str)]) -> SchemaMap {
        let mut map = SchemaMap::new();
        for (name, data_type) in columns {
            map.insert(
                *name,
                SchemaEntry {
                    data_type: (*data_type).into(),
                    nullable: true,
                    metadata: "{}".into(),
                },
            );
        }
        map
    }

    #[test]
    fn numbers_follow_the_declared_column_type() {
        let schema = schema_of(&[
            ("price", "double"),
            ("qty", "integer"),
            ("big", "long"),
            ("tiny", "short"),
            ("ratio", "float"),
        ]);
        let raw = r#"{
            "numRecords": 2,
            "minValues": {"price": 1.5, "qty": 1, "big": 7, "tiny": -2, "ratio": 0.25},
            "maxValues": {"price": 20, "qty": 40, "big": 9000000000, "tiny": 3, "ratio": 1}
        }"#;
        let summary = StatsSummary::from_json_with_schema(raw, &schema).unwrap();
        assert_eq!(
            summary.max_values["qty"],
            Some(StatValue::Int32(40))
        );
        assert_eq!(
            summary.max_values["tiny"],
            Some(StatValue::Int16(3))
        );
        let frame = project_stats(&summary, "f");
        assert_eq!(frame.row_texts(0), ["big", "9000000000", "7", ""]);
        assert_eq!(frame.row_texts(1), ["price", "20.00", "1.50", ""]);
        assert_eq!(frame.row_texts(2), ["qty", "40", "1", ""]);
        assert_eq!(frame.row_texts(3), ["ratio", "1.00", "0.25", ""]);
        assert_eq!(frame.row_texts(4), ["tiny", "3", "-2", ""]);
    }

    #[test]
    fn integer_column_with_fractional_value_stays_float() {
        let schema = schema_of(&[("n", "integer")]);
        let value = StatValue::from_json_as(&json!(2.5), Some("integer"));
        assert_eq!(value, Some(StatValue::Float64(2.5)));
        let summary =
            StatsSummary::from_json_with_schema(r#"{"maxValues": {"n": 2.5}}"#, &schema).unwrap();
        assert_eq!(project_stats(&summary, "f").row_texts(0), ["n", "2.50", "", ""]);
    }

    #[test]
    fn unrepresentable_values_keep_their_row() {
        let raw = r#"{
            "numRecords": 1,
            "minValues": {"a": 1, "flag": false},
            "maxValues": {"a": 2, "flag": true, "nested": {"x": 3}},
            "nullCount": {"a": 0, "flag": 0, "nested": 1}
        }"#;
        let summary = StatsSummary::from_json(raw).unwrap();
        assert_eq!(summary.sorted_keys(), ["a", "flag", "nested"]);
        assert_eq!(summary.max_values["flag"], None);
        let frame = project_stats(&summary, "f");
        assert_eq!(frame.row_texts(0), ["a", "2.00", "1.00", "0"]);
        assert_eq!(frame.row_texts(1), ["flag", "", "", "0"]);
        assert_eq!(frame.row_texts(2), ["nested", "", "", "1"]);
    }

    #[test]
    fn missing_min_leaves_cell_blank() {
        let mut summary = StatsSummary::default();
        summary
            .max_values
            .insert("x".into(), Some(StatValue::Int64(1)));
        let frame = project_stats(&summary, "f");
        assert_eq!(frame.row_texts(0), ["x", "1", "", ""]);
    }

    #[test]
    fn malformed_stats_is_an_error() {
        assert!(StatsSummary::from_json("{not json").is_err());
    }
}
