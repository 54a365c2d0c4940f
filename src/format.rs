//! Cell formatting for the data grid.
//!
//! Turns one slot of an Arrow array into the text shown in a grid cell.
//! Formatting never fails: types without a rendering yield `None` and the
//! caller leaves that cell unset.

use arrow::array::{
    Array, BinaryArray, BooleanArray, Date32Array, Date64Array, Decimal128Array, Float16Array,
    Float32Array, Float64Array, Int16Array, Int32Array, Int64Array, IntervalDayTimeArray,
    LargeBinaryArray, LargeStringArray, StringArray, StructArray, TimestampMicrosecondArray,
    TimestampMillisecondArray, TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, IntervalUnit, TimeUnit};
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use arrow::util::display::array_value_to_string;
use chrono::{Local, NaiveDateTime, TimeZone, Utc};

use crate::grid::{Align, CellAttrs};

/// Widest a data cell is ever drawn.
pub const MAX_CELL_WIDTH: usize = 32;

/// Decimal128 values are always read with this many fractional digits.
pub const DECIMAL_SCALE: i32 = 2;

/// Text shown for null slots.
pub const NULL_TEXT: &str = "NULL";

const TIME_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z %Z";
/// `%Z` on a local time prints the offset again, so local times stop at `%z`.
const LOCAL_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Format the value at `row` of `array`.
///
/// `None` means the type has no rendering (or `row` is out of bounds); the
/// grid cell should then stay unset.
pub fn format_value(array: &dyn Array, row: usize) -> Option<String> {
    if row >= array.len() {
        return None;
    }
    if array.is_null(row) {
        return Some(NULL_TEXT.to_string());
    }

    match array.data_type() {
        DataType::Utf8 => downcast::<StringArray>(array).map(|a| a.value(row).to_string()),
        DataType::LargeUtf8 => {
            downcast::<LargeStringArray>(array).map(|a| a.value(row).to_string())
        }

        DataType::Int16 => downcast::<Int16Array>(array).map(|a| a.value(row).to_string()),
        DataType::Int32 => downcast::<Int32Array>(array).map(|a| a.value(row).to_string()),
        DataType::Int64 => downcast::<Int64Array>(array).map(|a| a.value(row).to_string()),

        DataType::Float16 => {
            downcast::<Float16Array>(array).map(|a| format_float(a.value(row).to_f32() as f64))
        }
        DataType::Float32 => {
            downcast::<Float32Array>(array).map(|a| format_float(a.value(row) as f64))
        }
        DataType::Float64 => downcast::<Float64Array>(array).map(|a| format_float(a.value(row))),

        DataType::Boolean => downcast::<BooleanArray>(array).map(|a| a.value(row).to_string()),

        DataType::Binary => downcast::<BinaryArray>(array).map(|a| format!("{:?}", a.value(row))),
        DataType::LargeBinary => {
            downcast::<LargeBinaryArray>(array).map(|a| format!("{:?}", a.value(row)))
        }

        DataType::Date32 => downcast::<Date32Array>(array)
            .and_then(|a| date32_to_datetime(a.value(row)))
            .map(format_utc),
        DataType::Date64 => downcast::<Date64Array>(array)
            .and_then(|a| date64_to_datetime(a.value(row)))
            .map(format_local),

        DataType::Timestamp(unit, _) => timestamp_at(array, row, *unit).map(format_utc),

        DataType::Decimal128(_, _) => {
            downcast::<Decimal128Array>(array).map(|a| format_decimal(a.value(row)))
        }

        DataType::Interval(IntervalUnit::DayTime) => {
            downcast::<IntervalDayTimeArray>(array).map(|a| format!("{:?}", a.value(row)))
        }

        DataType::Struct(_) => format_struct(array, row),

        DataType::Map(_, _) => array_value_to_string(array, row).ok(),

        other => {
            tracing::trace!(data_type = %other, "no cell rendering for type");
            None
        }
    }
}

/// Presentation attributes for data cells of the given type.
pub fn cell_attrs(data_type: &DataType) -> CellAttrs {
    let base = CellAttrs::default().max_width(MAX_CELL_WIDTH);
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Map(_, _) => {
            base.align(Align::Left).expansion(2)
        }
        DataType::Struct(_) => base.align(Align::Left).expansion(4),
        DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::Float16
        | DataType::Float32
        | DataType::Float64
        | DataType::Boolean => base.align(Align::Right).expansion(1),
        DataType::Binary
        | DataType::LargeBinary
        | DataType::Date32
        | DataType::Date64
        | DataType::Timestamp(_, _)
        | DataType::Decimal128(_, _)
        | DataType::Interval(_) => base.align(Align::Right).expansion(2),
        _ => base.align(Align::Left).expansion(1),
    }
}

/// Two fixed decimals, shared with the statistics grid.
pub fn format_float(value: f64) -> String {
    format!("{value:.2}")
}

/// Raw Decimal128 at the fixed scale: `12345` reads as `123.45`.
pub fn format_decimal(raw: i128) -> String {
    format_float(raw as f64 / 10f64.powi(DECIMAL_SCALE))
}

fn downcast<T: 'static>(array: &dyn Array) -> Option<&T> {
    array.as_any().downcast_ref::<T>()
}

fn format_utc(naive: NaiveDateTime) -> String {
    Utc.from_utc_datetime(&naive).format(TIME_LAYOUT).to_string()
}

fn format_local(naive: NaiveDateTime) -> String {
    Local.from_utc_datetime(&naive).format(LOCAL_LAYOUT).to_string()
}

fn timestamp_at(array: &dyn Array, row: usize, unit: TimeUnit) -> Option<NaiveDateTime> {
    match unit {
        TimeUnit::Second => {
            downcast::<TimestampSecondArray>(array).and_then(|a| timestamp_s_to_datetime(a.value(row)))
        }
        TimeUnit::Millisecond => downcast::<TimestampMillisecondArray>(array)
            .and_then(|a| timestamp_ms_to_datetime(a.value(row))),
        TimeUnit::Microsecond => downcast::<TimestampMicrosecondArray>(array)
            .and_then(|a| timestamp_us_to_datetime(a.value(row))),
        TimeUnit::Nanosecond => downcast::<TimestampNanosecondArray>(array)
            .and_then(|a| timestamp_ns_to_datetime(a.value(row))),
    }
}

// Only child 1 is rendered; child 0 is logged and otherwise ignored.
fn format_struct(array: &dyn Array, row: usize) -> Option<String> {
    let structs = downcast::<StructArray>(array)?;
    if structs.num_columns() < 2 {
        return None;
    }
    tracing::trace!(field0_type = %structs.column(0).data_type(), "struct cell");
    format_value(structs.column(1).as_ref(), row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        ArrayRef, Int32Builder, MapBuilder, StringBuilder, UInt8Array,
    };
    use arrow::datatypes::{Field, Fields, IntervalDayTime};
    use std::sync::Arc;

    fn make_float64_array(values: Vec<Option<f64>>) -> ArrayRef {
        Arc::new(Float64Array::from(values))
    }

    fn make_int32_array(values: Vec<Option<i32>>) -> ArrayRef {
        Arc::new(Int32Array::from(values))
    }

    fn make_struct_array() -> ArrayRef {
        let ids: ArrayRef = Arc::new(Int32Array::from(vec![7, 8]));
        let labels: ArrayRef = Arc::new(StringArray::from(vec!["seven", "eight"]));
        Arc::new(StructArray::from(vec![
            (Arc::new(Field::new("id", DataType::Int32, false)), ids),
            (Arc::new(Field::new("label", DataType::Utf8, false)), labels),
        ]))
    }

    #[test]
    fn float64_two_decimals() {
        let array = make_float64_array(vec![Some(3.14159), Some(3.1)]);
        assert_eq!(format_value(array.as_ref(), 0).as_deref(), Some("3.14"));
        assert_eq!(format_value(array.as_ref(), 1).as_deref(), Some("3.10"));
    }

    #[test]
    fn float32_and_float16() {
        let f32s: ArrayRef = Arc::new(Float32Array::from(vec![2.5f32]));
        assert_eq!(format_value(f32s.as_ref(), 0).as_deref(), Some("2.50"));

        let halves: ArrayRef = Arc::new(Float32Array::from(vec![1.5f32]));
        let f16s = arrow::compute::cast(&halves, &DataType::Float16).unwrap();
        assert_eq!(format_value(f16s.as_ref(), 0).as_deref(), Some("1.50"));
    }

    #[test]
    fn integers_without_grouping() {
        let array = make_int32_array(vec![Some(42), Some(-1_000_000)]);
        assert_eq!(format_value(array.as_ref(), 0).as_deref(), Some("42"));
        assert_eq!(format_value(array.as_ref(), 1).as_deref(), Some("-1000000"));

        let i16s: ArrayRef = Arc::new(Int16Array::from(vec![-7i16]));
        assert_eq!(format_value(i16s.as_ref(), 0).as_deref(), Some("-7"));

        let i64s: ArrayRef = Arc::new(Int64Array::from(vec![9_007_199_254_740_993i64]));
        assert_eq!(
            format_value(i64s.as_ref(), 0).as_deref(),
            Some("9007199254740993")
        );
    }

    #[test]
    fn strings_and_booleans_verbatim() {
        let strings: ArrayRef = Arc::new(StringArray::from(vec!["  padded  "]));
        assert_eq!(format_value(strings.as_ref(), 0).as_deref(), Some("  padded  "));

        let bools: ArrayRef = Arc::new(BooleanArray::from(vec![true, false]));
        assert_eq!(format_value(bools.as_ref(), 0).as_deref(), Some("true"));
        assert_eq!(format_value(bools.as_ref(), 1).as_deref(), Some("false"));
    }

    #[test]
    fn binary_uses_debug_bytes() {
        let array: ArrayRef = Arc::new(BinaryArray::from_vec(vec![&[1u8, 2, 255][..]]));
        assert_eq!(format_value(array.as_ref(), 0).as_deref(), Some("[1, 2, 255]"));
    }

    #[test]
    fn decimal_fixed_scale_two() {
        let array: ArrayRef = Arc::new(
            Decimal128Array::from(vec![12345i128, -5])
                .with_precision_and_scale(10, 4)
                .unwrap(),
        );
        // declared scale 4 is ignored
        assert_eq!(format_value(array.as_ref(), 0).as_deref(), Some("123.45"));
        assert_eq!(format_value(array.as_ref(), 1).as_deref(), Some("-0.05"));
    }

    #[test]
    fn date32_renders_utc_midnight() {
        let array: ArrayRef = Arc::new(Date32Array::from(vec![0, 18_000]));
        assert_eq!(
            format_value(array.as_ref(), 0).as_deref(),
            Some("1970-01-01 00:00:00 +0000 UTC")
        );
        assert_eq!(
            format_value(array.as_ref(), 1).as_deref(),
            Some("2019-04-14 00:00:00 +0000 UTC")
        );
    }

    #[test]
    fn date64_renders_local_time() {
        let array: ArrayRef = Arc::new(Date64Array::from(vec![86_400_000i64]));
        let text = format_value(array.as_ref(), 0).unwrap();
        let local = Local.from_utc_datetime(&date64_to_datetime(86_400_000).unwrap());
        let expected = format!(
            "{} {}",
            local.format("%Y-%m-%d %H:%M:%S"),
            local.format("%z")
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn timestamp_keeps_nanoseconds() {
        let array: ArrayRef = Arc::new(TimestampNanosecondArray::from(vec![1_000_000_001i64]));
        assert_eq!(
            format_value(array.as_ref(), 0).as_deref(),
            Some("1970-01-01 00:00:01.000000001 +0000 UTC")
        );
    }

    #[test]
    fn timestamp_honours_unit() {
        let array: ArrayRef = Arc::new(TimestampMillisecondArray::from(vec![1_500i64]));
        assert_eq!(
            format_value(array.as_ref(), 0).as_deref(),
            Some("1970-01-01 00:00:01.500 +0000 UTC")
        );
    }

    #[test]
    fn interval_day_time_debug() {
        let array: ArrayRef = Arc::new(IntervalDayTimeArray::from(vec![IntervalDayTime::new(3, 500)]));
        assert_eq!(
            format_value(array.as_ref(), 0).as_deref(),
            Some("IntervalDayTime { days: 3, milliseconds: 500 }")
        );
    }

    #[test]
    fn struct_renders_second_field_only() {
        let array = make_struct_array();
        assert_eq!(format_value(array.as_ref(), 0).as_deref(), Some("seven"));
        assert_eq!(format_value(array.as_ref(), 1).as_deref(), Some("eight"));
    }

    #[test]
    fn struct_with_one_field_is_unset() {
        let ids: ArrayRef = Arc::new(Int32Array::from(vec![1]));
        let array: ArrayRef = Arc::new(StructArray::from(vec![(
            Arc::new(Field::new("id", DataType::Int32, false)),
            ids,
        )]));
        assert_eq!(format_value(array.as_ref(), 0), None);
    }

    #[test]
    fn map_renders_whole_entry_set() {
        let mut builder = MapBuilder::new(None, StringBuilder::new(), Int32Builder::new());
        builder.keys().append_value("a");
        builder.values().append_value(1);
        builder.keys().append_value("b");
        builder.values().append_value(2);
        builder.append(true).unwrap();
        let array: ArrayRef = Arc::new(builder.finish());
        let text = format_value(array.as_ref(), 0).unwrap();
        assert!(text.contains("a: 1"), "{text}");
        assert!(text.contains("b: 2"), "{text}");
    }

    #[test]
    fn nulls_render_as_null_text() {
        let array = make_int32_array(vec![None]);
        assert_eq!(format_value(array.as_ref(), 0).as_deref(), Some(NULL_TEXT));
    }

    #[test]
    fn unsupported_type_is_none() {
        let array: ArrayRef = Arc::new(UInt8Array::from(vec![1u8]));
        assert_eq!(format_value(array.as_ref(), 0), None);
    }

    #[test]
    fn out_of_bounds_is_none() {
        let array = make_int32_array(vec![Some(1)]);
        assert_eq!(format_value(array.as_ref(), 5), None);
    }

    #[test]
    fn formatting_is_deterministic() {
        let arrays: Vec<ArrayRef> = vec![
            make_float64_array(vec![Some(0.125)]),
            make_int32_array(vec![Some(1)]),
            make_struct_array(),
            Arc::new(Date32Array::from(vec![1])),
        ];
        for array in arrays {
            assert_eq!(
                format_value(array.as_ref(), 0),
                format_value(array.as_ref(), 0)
            );
        }
    }

    #[test]
    fn attrs_right_align_numbers_left_align_text() {
        assert_eq!(cell_attrs(&DataType::Int64).align, Align::Right);
        assert_eq!(cell_attrs(&DataType::Boolean).align, Align::Right);
        assert_eq!(cell_attrs(&DataType::Date32).align, Align::Right);
        assert_eq!(cell_attrs(&DataType::Utf8).align, Align::Left);
        assert_eq!(
            cell_attrs(&DataType::Struct(Fields::empty())).align,
            Align::Left
        );
        assert_eq!(cell_attrs(&DataType::Utf8).max_width, MAX_CELL_WIDTH);
    }
}
