use serde_json::Value;
use std::io;

use super::{flatten, format_scalar};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) if result.contains_key("matrix") => {
                write_matrix_csv(&mut wtr, result);
            }
            Some(Value::Object(result)) => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten(result) {
                    let _ = wtr.write_record([key, format_scalar(&val)]);
                }
            }
            _ => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in flatten(map) {
                    let _ = wtr.write_record([key, format_scalar(&val)]);
                }
            }
        },
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

/// One row per grid cell: variable_1, variable_2, value.
fn write_matrix_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, result: &serde_json::Map<String, Value>) {
    let empty = Vec::new();
    let rows = result.get("variable_1_values").and_then(Value::as_array).unwrap_or(&empty);
    let cols = result.get("variable_2_values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = result.get("matrix").and_then(Value::as_array).unwrap_or(&empty);

    let name = |key: &str| result.get(key).map(format_scalar).unwrap_or_default();
    let _ = wtr.write_record([name("variable_1_name"), name("variable_2_name"), name("output_metric")]);

    for (v1, row) in rows.iter().zip(matrix) {
        let Value::Array(cells) = row else { continue };
        for (j, cell) in cells.iter().enumerate() {
            let v2 = cols.get(j).map(format_scalar).unwrap_or_default();
            let _ = wtr.write_record([format_scalar(v1), v2, format_scalar(cell)]);
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
    }
}
