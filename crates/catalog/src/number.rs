/// Parse a decimal number written with `.` as the decimal separator.
///
/// Surrounding whitespace is ignored. The convention is fixed and does not
/// depend on the locale: `"12.5"` parses, `"12,5"` and `"1,000"` do not.
/// Exponents (`"1e3"`) and an explicit sign are accepted. Only finite values
/// count as numbers: `"inf"`, `"NaN"` and overflowing literals such as
/// `"1e400"` do not parse.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|value| value.is_finite())
}
