pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// Render a single cell. Decimals arrive as strings.
pub fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_scalar).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Chart series as columns: label, actual balance, standard balance.
pub fn chart_rows(chart: &Map<String, Value>) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let column = |key: &str| -> Vec<Value> {
        chart
            .get(key)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()
    };
    let labels = column("time_labels");
    let balances = column("balances");
    let standard = column("standard_balances");

    let rows = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            vec![
                format_scalar(label),
                balances.get(i).map(format_scalar).unwrap_or_default(),
                standard.get(i).map(format_scalar).unwrap_or_default(),
            ]
        })
        .collect();
    (vec!["year", "balance", "standard_balance"], rows)
}

/// Headers from the first object, one row per object.
pub fn object_rows(arr: &[Value]) -> Option<(Vec<String>, Vec<Vec<String>>)> {
    let Value::Object(first) = arr.first()? else {
        return None;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let rows = arr
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|h| map.get(h).map(format_scalar).unwrap_or_default())
                .collect()
        })
        .collect();
    Some((headers, rows))
}
