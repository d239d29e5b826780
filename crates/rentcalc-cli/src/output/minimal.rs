use serde_json::{Map, Value};

use super::format_scalar;

// Headline figure per command, in order of preference.
const PRIORITY_KEYS: [&str; 6] = [
    "irr",
    "base_case_value",
    "cash_on_cash_avg",
    "wealth_accumulation",
    "cash_flow_post_tax_year1",
    "noi",
];

/// Print just the key answer value from the output.
///
/// Looks for a priority field in the result and its sections, then falls
/// back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = find_priority(map) {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

/// First non-null priority key, at the top level or one section down.
fn find_priority(map: &Map<String, Value>) -> Option<&Value> {
    for key in PRIORITY_KEYS {
        if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
            return Some(val);
        }
        let nested = map
            .values()
            .filter_map(Value::as_object)
            .filter_map(|section| section.get(key))
            .find(|v| !v.is_null());
        if nested.is_some() {
            return nested;
        }
    }
    None
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        other => format_scalar(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_irr_found_inside_section() {
        let result = json!({
            "acquisition": { "equity_required": "24000" },
            "return_metrics": { "irr": "8.25", "cash_on_cash_avg": "3.1" }
        });
        let found = find_priority(result.as_object().unwrap());
        assert_eq!(found, Some(&json!("8.25")));
    }

    #[test]
    fn test_null_irr_falls_through() {
        let result = json!({
            "return_metrics": { "irr": null, "cash_on_cash_avg": "3.1" }
        });
        let found = find_priority(result.as_object().unwrap());
        assert_eq!(found, Some(&json!("3.1")));
    }
}
