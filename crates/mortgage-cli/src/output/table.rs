use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{chart_rows, format_scalar, object_rows};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) if map.contains_key("result") => print_envelope(map),
        Value::Object(map) if map.contains_key("time_labels") => print_chart(map),
        Value::Object(map) => print_fields(map),
        Value::Array(arr) => print_rows(arr),
        _ => println!("{}", format_scalar(value)),
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
    match envelope.get("result") {
        Some(Value::Object(result)) => {
            match result.get("results") {
                Some(Value::Object(summary)) => print_fields(summary),
                _ => print_fields(result),
            }
            if let Some(Value::Object(chart)) = result.get("chart_data") {
                println!();
                print_chart(chart);
            }
        }
        Some(other) => println!("{}", format_scalar(other)),
        None => {}
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_chart(chart: &Map<String, Value>) {
    let (headers, rows) = chart_rows(chart);
    let mut builder = Builder::default();
    builder.push_record(headers);
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));

    if let Some(Value::Array(events)) = chart.get("payment_events") {
        if !events.is_empty() {
            println!("\nRepayment changes:");
            print_rows(events);
        }
    }
}

fn print_rows(arr: &[Value]) {
    match object_rows(arr) {
        Some((headers, rows)) => {
            let mut builder = Builder::default();
            builder.push_record(headers);
            for row in rows {
                builder.push_record(row);
            }
            println!("{}", Table::from(builder));
        }
        None if arr.is_empty() => println!("(empty)"),
        None => {
            for item in arr {
                println!("{}", format_scalar(item));
            }
        }
    }
}
