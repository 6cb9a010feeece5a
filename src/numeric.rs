use serde_json::Value;

/// Parses a float prefix the way loosely typed sensor payloads expect it,
/// e.g. "12.5kWh" gives 12.5 while "abc" gives NaN
///
/// # Arguments
///
/// * 'text' - text to parse
pub fn parse_float(text: &str) -> f64 {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return f64::NAN;
    }

    for prefix in ["Infinity", "+Infinity"] {
        if trimmed.starts_with(prefix) {
            return f64::INFINITY;
        }
    }
    if trimmed.starts_with("-Infinity") {
        return f64::NEG_INFINITY;
    }

    let candidate_len = trimmed
        .char_indices()
        .take_while(|&(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);

    (1..=candidate_len)
        .rev()
        .filter_map(|end| trimmed[..end].parse::<f64>().ok())
        .next()
        .unwrap_or(f64::NAN)
}

/// Reads a JSON value as a number, strings are parsed, anything else is NaN
///
/// # Arguments
///
/// * 'value' - the JSON value
pub fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_float(s),
        _ => f64::NAN,
    }
}

/// Reads an optional field as a number where a missing field or null counts as zero
///
/// # Arguments
///
/// * 'value' - the field, if present
pub fn field_or_zero(value: Option<&Value>) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(v) => value_to_f64(v),
    }
}

/// Formats a number for display, anything not finite shows as "0" and a negative
/// zero shows unsigned
///
/// # Arguments
///
/// * 'value' - number to format
/// * 'decimals' - fixed number of decimals
pub fn display_number(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        let text = format!("{:.*}", decimals, value);
        match text.strip_prefix('-') {
            Some(unsigned) if unsigned.chars().all(|c| c == '0' || c == '.') => unsigned.to_string(),
            _ => text,
        }
    } else {
        "0".to_string()
    }
}

/// Serde serializer for f64 fields in display state, anything not finite is written as 0
///
pub fn serialize_finite<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(if value.is_finite() { *value } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn float_prefix_is_parsed() {
        assert_eq!(parse_float("12.5kWh"), 12.5);
        assert_eq!(parse_float("  -3"), -3.0);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("7."), 7.0);
        assert_eq!(parse_float("Infinity"), f64::INFINITY);
    }

    #[test]
    fn non_numeric_text_is_nan() {
        assert!(parse_float("abc").is_nan());
        assert!(parse_float("").is_nan());
        assert!(parse_float("-").is_nan());
    }

    #[test]
    fn json_values_convert() {
        assert_eq!(value_to_f64(&json!(4)), 4.0);
        assert_eq!(value_to_f64(&json!("4.25")), 4.25);
        assert!(value_to_f64(&json!(true)).is_nan());
        assert!(value_to_f64(&json!({"a": 1})).is_nan());
    }

    #[test]
    fn missing_fields_count_as_zero() {
        assert_eq!(field_or_zero(None), 0.0);
        assert_eq!(field_or_zero(Some(&Value::Null)), 0.0);
        assert!(field_or_zero(Some(&json!("n/a"))).is_nan());
    }

    #[test]
    fn display_scrubs_nan() {
        assert_eq!(display_number(f64::NAN, 2), "0");
        assert_eq!(display_number(f64::INFINITY, 0), "0");
        assert_eq!(display_number(17.4, 2), "17.40");
        assert_eq!(display_number(2.0 / 3.0, 3), "0.667");
    }

    #[test]
    fn display_drops_the_sign_of_zero() {
        assert_eq!(display_number(-0.0, 2), "0.00");
        assert_eq!(display_number(-0.001, 2), "0.00");
        assert_eq!(display_number(-0.5, 1), "-0.5");
    }
}
