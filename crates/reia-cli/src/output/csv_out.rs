use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// The first array of objects in the result becomes the rows (projections,
/// ranked scenarios, sensitivity tables). Rows that hold their own array are
/// flattened, so each sensitivity point is one line tagged with its driver.
/// Results with no such array are written as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => match first_object_array(map) {
            Some(rows) => write_rows(&mut wtr, &flatten(rows)),
            None => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        },
        Value::Array(arr) => write_rows(&mut wtr, &flatten(arr)),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn first_object_array(map: &Map<String, Value>) -> Option<&Vec<Value>> {
    map.values().find_map(|v| match v {
        Value::Array(arr) if arr.first().map(Value::is_object).unwrap_or(false) => Some(arr),
        _ => None,
    })
}

/// Scalar columns of each row, with any nested object array expanded into
/// one line per child carrying the parent's scalar columns first.
fn flatten(rows: &[Value]) -> Vec<Vec<(String, String)>> {
    let mut out = Vec::new();
    for row in rows {
        let map = match row {
            Value::Object(map) => map,
            other => {
                out.push(vec![("value".to_string(), format_csv_value(other))]);
                continue;
            }
        };

        let scalars: Vec<(String, String)> = map
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Object(_) | Value::Array(_)))
            .map(|(k, v)| (k.clone(), format_csv_value(v)))
            .collect();

        match first_object_array(map) {
            Some(children) => {
                for child in flatten(children) {
                    let mut line = scalars.clone();
                    line.extend(child);
                    out.push(line);
                }
            }
            None => out.push(scalars),
        }
    }
    out
}

fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Vec<(String, String)>]) {
    let headers: Vec<&str> = match rows.first() {
        Some(first) => first.iter().map(|(k, _)| k.as_str()).collect(),
        None => return,
    };
    let _ = wtr.write_record(&headers);
    for row in rows {
        let _ = wtr.write_record(row.iter().map(|(_, v)| v.as_str()));
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
