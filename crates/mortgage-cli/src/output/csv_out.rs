use serde_json::{Map, Value};
use std::io;

use super::{chart_rows, format_scalar, object_rows};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A full calculation exports its schedule, so the file opens straight into a
/// spreadsheet one row per period.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => match result.get("schedule") {
                Some(Value::Array(rows)) => write_array_csv(&mut wtr, rows),
                _ => write_fields_csv(&mut wtr, result),
            },
            Some(other) => {
                let _ = wtr.write_record([format_scalar(other)]);
            }
            None if map.contains_key("time_labels") => write_chart_csv(&mut wtr, map),
            None => write_fields_csv(&mut wtr, map),
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields_csv(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
    }
}

fn write_chart_csv(wtr: &mut StdoutWriter<'_>, chart: &Map<String, Value>) {
    let (headers, rows) = chart_rows(chart);
    let _ = wtr.write_record(headers);
    for row in rows {
        let _ = wtr.write_record(row);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    match object_rows(arr) {
        Some((headers, rows)) => {
            let _ = wtr.write_record(&headers);
            for row in rows {
                let _ = wtr.write_record(row);
            }
        }
        None => {
            for item in arr {
                let _ = wtr.write_record([format_scalar(item)]);
            }
        }
    }
}
