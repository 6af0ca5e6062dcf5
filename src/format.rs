//! Display formatting shared by listings, reports and exports.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

/// Group digits by thousands with a space: `1500000` -> `1 500 000`
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Whole-unit amount followed by the currency code
pub fn format_currency(amount: Decimal, currency: &str) -> String {
    let whole = amount.round().to_i64().unwrap_or(0);
    format!("{} {}", group_thousands(whole), currency)
}

/// Day-first date as shown in the console
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

/// Cut to `max` characters and mark the cut with an ellipsis
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

/// JSON number for a decimal amount
pub fn decimal_value(amount: Decimal) -> Value {
    amount
        .to_f64()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// JSON string, or null for `None`
pub fn optional_value(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1 000");
        assert_eq!(group_thousands(1_500_000), "1 500 000");
        assert_eq!(group_thousands(-25_000), "-25 000");
    }

    #[test]
    fn test_format_currency_rounds() {
        assert_eq!(format_currency(dec!(2500000.60), "FCFA"), "2 500 001 FCFA");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("éèàùç-long", 5), "éèàùç...");
    }

    #[test]
    fn test_decimal_value() {
        assert_eq!(decimal_value(dec!(1250.5)), serde_json::json!(1250.5));
    }
}
