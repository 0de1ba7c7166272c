use serde_json::Value;

use super::{format_scalar, result_of};

/// Print just the headline answer of a computation.
///
/// Previews print the coupon, batches the best quote, payoffs the
/// redemption range and enumerations the basket count.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(result_of(value)));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return format_scalar(result, "null");
    };

    if let Some(coupon) = map
        .get("quote")
        .and_then(|q| q.get("annualized_coupon_pct"))
    {
        return format_scalar(coupon, "null");
    }

    if let Some(Value::Array(quotes)) = map.get("quotes") {
        return match quotes.first() {
            Some(best) => format!(
                "{} {} {}",
                best.get("id").map(|v| format_scalar(v, "")).unwrap_or_default(),
                best.get("assets").map(|v| format_scalar(v, "")).unwrap_or_default(),
                best.get("coupon_rate_pct")
                    .map(|v| format_scalar(v, "null"))
                    .unwrap_or_default(),
            ),
            None => "no quotes".to_string(),
        };
    }

    if let (Some(min), Some(max)) = (map.get("min_redemption_pct"), map.get("max_redemption_pct")) {
        return format!("{}..{}", format_scalar(min, "null"), format_scalar(max, "null"));
    }

    for key in ["coupon_rate_pct", "total_count"] {
        if let Some(val) = map.get(key) {
            if !val.is_null() {
                return format_scalar(val, "null");
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_scalar(val, "null")),
        None => String::new(),
    }
}
