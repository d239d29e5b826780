use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten, format_scalar};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_field_table(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) if res_map.contains_key("matrix") => print_matrix(res_map),
        Value::Object(res_map) => print_field_table(res_map),
        _ => print_field_table(envelope),
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

fn print_field_table(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten(map) {
        builder.push_record([key, format_scalar(&val)]);
    }
    println!("{}", Table::from(builder));
}

/// Sensitivity grid: variable_1 down the rows, variable_2 across.
fn print_matrix(res_map: &Map<String, Value>) {
    let empty = Vec::new();
    let rows = res_map.get("variable_1_values").and_then(Value::as_array).unwrap_or(&empty);
    let cols = res_map.get("variable_2_values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = res_map.get("matrix").and_then(Value::as_array).unwrap_or(&empty);

    let corner = format!(
        "{} \\ {}",
        res_map.get("variable_1_name").map(format_scalar).unwrap_or_default(),
        res_map.get("variable_2_name").map(format_scalar).unwrap_or_default()
    );

    let mut builder = Builder::default();
    let mut header = vec![corner];
    if cols.is_empty() {
        header.push(res_map.get("output_metric").map(format_scalar).unwrap_or_default());
    } else {
        header.extend(cols.iter().map(format_scalar));
    }
    builder.push_record(header);

    for (label, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_scalar(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(|c| match c {
                Value::Null => "n/a".to_string(),
                other => format_scalar(other),
            }));
        }
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));

    if let Some(base) = res_map.get("base_case_value") {
        println!("\nBase case: {}", format_scalar(base));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_scalar(item));
        }
    }
}
