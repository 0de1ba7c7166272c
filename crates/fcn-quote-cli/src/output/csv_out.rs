use serde_json::Value;
use std::io;

use super::{format_scalar, result_of, rows_of};

/// Write output as CSV to stdout: one row per quote, payoff point or
/// basket when the result has rows, otherwise field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = result_of(value);
    if let Some((_, rows)) = rows_of(result) {
        write_rows(&mut wtr, rows);
    } else if let Value::Object(map) = result {
        let _ = wtr.write_record(["field", "value"]);
        for (key, val) in map {
            let _ = wtr.write_record([key.as_str(), &format_scalar(val, "")]);
        }
    } else if let Value::Array(rows) = result {
        write_rows(&mut wtr, rows);
    } else {
        let _ = wtr.write_record([format_scalar(result, "")]);
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            let _ = wtr.write_record([format_scalar(item, "")]);
        }
        return;
    };

    let headers: Vec<&str> = first
        .iter()
        .filter(|(_, v)| !v.is_object())
        .map(|(k, _)| k.as_str())
        .collect();
    let _ = wtr.write_record(&headers);

    for item in rows {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(|v| format_scalar(v, "")).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}
