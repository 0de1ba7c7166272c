use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_scalar, result_of, ROW_KEYS};

/// Format output as tables: scalar result fields first, then one table per
/// row array (quotes, payoff points, baskets, failures).
pub fn print_table(value: &Value) {
    let result = result_of(value);
    match result {
        Value::Object(map) => {
            print_fields(map);
            for key in ROW_KEYS.iter().chain(["failures"].iter()) {
                if let Some(Value::Array(rows)) = map.get(*key) {
                    println!("\n{}:", key);
                    print_rows(rows);
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        other => println!("{}", format_scalar(other, "null")),
    }

    if let Some(envelope) = value.as_object() {
        print_notes(envelope);
    }
}

/// Scalar fields, with nested objects flattened to dotted keys.
fn print_fields(map: &Map<String, Value>) {
    let mut fields = Vec::new();
    collect_fields("", map, &mut fields);
    if fields.is_empty() {
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in fields {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));
}

fn collect_fields(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => collect_fields(&name, inner, out),
            Value::Array(items) if items.iter().any(|v| v.is_object()) => {}
            other => out.push((name, format_scalar(other, "-"))),
        }
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        if rows.is_empty() {
            println!("(empty)");
        }
        for item in rows {
            println!("{}", format_scalar(item, "-"));
        }
        return;
    };

    // Nested per-row objects (market snapshots) stay in the JSON output.
    let headers: Vec<&str> = first
        .iter()
        .filter(|(_, v)| !v.is_object())
        .map(|(k, _)| k.as_str())
        .collect();

    let mut builder = Builder::default();
    builder.push_record(headers.iter().copied());
    for item in rows {
        if let Value::Object(map) = item {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(*h).map(|v| format_scalar(v, "-")).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_notes(envelope: &Map<String, Value>) {
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
