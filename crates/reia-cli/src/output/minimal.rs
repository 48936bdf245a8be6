use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// then fall back to the first field in the result object.
pub fn print_minimal(value: &Value) {
    // Try to extract the "result" envelope
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    // Priority list of key output fields
    let priority_keys = ["best", "irr", "viability_score", "cap_rate", "noi"];

    if let Value::Object(map) = result_obj {
        // Sensitivity tables: one "driver value irr" line per point
        if let Some(Value::Array(tables)) = map.get("tables") {
            for table in tables {
                let driver = table.get("driver").map(format_minimal).unwrap_or_default();
                if let Some(Value::Array(points)) = table.get("points") {
                    for p in points {
                        let field = |k: &str| p.get(k).map(format_minimal).unwrap_or_default();
                        println!("{} {} {}", driver, field("value"), field("irr"));
                    }
                }
            }
            return;
        }

        // Try priority keys first (skip null values)
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Fall back to first field
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    // Not an object, just print directly
    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
