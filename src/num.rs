//! Canonical number formatting and parsing.
//!
//! Output is always plain decimal: no exponent notation, no trailing
//! zeros, `-0` collapses to `0`, integer-valued floats are written as
//! integers, and non-finite floats become `null`.

use itoa::Buffer as ItoaBuffer;
use ryu::Buffer as RyuBuffer;

use crate::value::Number;

pub(crate) fn write_number_into(n: &Number, out: &mut String) {
    match n {
        Number::PosInt(u) => {
            let mut buf = ItoaBuffer::new();
            out.push_str(buf.format(*u));
        }
        Number::NegInt(i) => {
            let mut buf = ItoaBuffer::new();
            out.push_str(buf.format(*i));
        }
        Number::Float(f) => write_f64_canonical(*f, out),
    }
}

fn write_f64_canonical(f: f64, out: &mut String) {
    if !f.is_finite() {
        out.push_str("null");
        return;
    }

    // Integer-valued floats collapse to their integer form; this also
    // takes care of -0.0.
    if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 {
        let i = f as i64;
        let mut buf = ItoaBuffer::new();
        out.push_str(buf.format(if i == 0 { 0 } else { i }));
        return;
    }

    let mut buf = RyuBuffer::new();
    let formatted = buf.format_finite(f);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            // Ryu's digits are the shortest run that round-trips; expand
            // them around the decimal point instead of reformatting, so
            // no precision is lost.
            let exponent: i32 = exponent.parse().expect("ryu exponent is an integer");
            expand_scientific(mantissa, exponent, out);
        }
        None => push_trimmed_decimal(formatted, out),
    }
}

fn expand_scientific(mantissa: &str, exponent: i32, out: &mut String) {
    let digits = match mantissa.strip_prefix('-') {
        Some(rest) => {
            out.push('-');
            rest
        }
        None => mantissa,
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let mut all = String::with_capacity(int_part.len() + frac_part.len());
    all.push_str(int_part);
    all.push_str(frac_part);
    let all = all.trim_end_matches('0');
    let point = int_part.len() as i32 + exponent;

    if all.is_empty() {
        out.push('0');
    } else if point <= 0 {
        out.push_str("0.");
        for _ in 0..-point {
            out.push('0');
        }
        out.push_str(all);
    } else if point as usize >= all.len() {
        out.push_str(all);
        for _ in 0..(point as usize - all.len()) {
            out.push('0');
        }
    } else {
        out.push_str(&all[..point as usize]);
        out.push('.');
        out.push_str(&all[point as usize..]);
    }
}

fn push_trimmed_decimal(s: &str, out: &mut String) {
    if let Some((int_part, frac_part)) = s.split_once('.') {
        let trimmed = frac_part.trim_end_matches('0');
        if trimmed.is_empty() {
            out.push_str(int_part);
        } else {
            out.push_str(int_part);
            out.push('.');
            out.push_str(trimmed);
        }
    } else {
        out.push_str(s);
    }
}

/// True when the token matches the decimal number grammar
/// `-?digits(.digits)?([eE][+-]?digits)?`.
///
/// This predicate is shared between the encoder's quoting rule and the
/// decoder's scalar classification so that the two stay exact inverses:
/// a string is quoted if and only if the bare token would read back as
/// something other than that string.
pub(crate) fn is_numeric_like(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut i = 0;
    if i < bytes.len() && bytes[i] == b'-' {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return false;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Parse a bare token as a number, preserving the integer/float split.
/// Returns `None` for anything outside the grammar, including `NaN`,
/// `Infinity` and tokens with stray characters that `f64::from_str`
/// would otherwise accept.
pub(crate) fn parse_number(token: &str) -> Option<Number> {
    if !is_numeric_like(token) {
        return None;
    }
    let has_float_syntax = token
        .as_bytes()
        .iter()
        .any(|byte| matches!(byte, b'.' | b'e' | b'E'));
    if !has_float_syntax {
        if let Ok(value) = token.parse::<i64>() {
            return Some(Number::from(value));
        }
        if let Ok(value) = token.parse::<u64>() {
            return Some(Number::PosInt(value));
        }
        // Out of integer range: degrade to float rather than fail.
        return token.parse::<f64>().ok().and_then(Number::from_f64);
    }
    token.parse::<f64>().ok().and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_number(n: &Number) -> String {
        let mut out = String::new();
        write_number_into(n, &mut out);
        out
    }

    #[rstest::rstest]
    fn test_format_integers() {
        assert_eq!(format_number(&Number::from(42i64)), "42");
        assert_eq!(format_number(&Number::from(-123i64)), "-123");
        assert_eq!(format_number(&Number::from(0i64)), "0");
        assert_eq!(format_number(&Number::PosInt(u64::MAX)), u64::MAX.to_string());
    }

    #[rstest::rstest]
    fn test_format_floats() {
        assert_eq!(format_number(&Number::Float(1.5)), "1.5");
        assert_eq!(format_number(&Number::Float(3.0)), "3");
        assert_eq!(format_number(&Number::Float(-0.0)), "0");
        assert_eq!(format_number(&Number::Float(0.001)), "0.001");
    }

    #[rstest::rstest]
    fn test_format_no_exponent() {
        let result = format_number(&Number::Float(1e9));
        assert_eq!(result, "1000000000");

        let result = format_number(&Number::Float(1e-6));
        assert!(result.starts_with("0.000001"));
        assert!(!result.contains('e'));
        assert!(!result.contains('E'));
    }

    #[rstest::rstest]
    fn test_format_small_floats_keep_full_precision() {
        for f in [1.2345678901234567e-7, 9.87e-20, -4.4e-5, 1.5e300] {
            let text = format_number(&Number::Float(f));
            assert!(!text.contains('e'));
            assert_eq!(text.parse::<f64>().unwrap(), f, "lost digits in {text}");
        }
    }

    #[rstest::rstest]
    fn test_format_non_finite_as_null() {
        assert_eq!(format_number(&Number::Float(f64::NAN)), "null");
        assert_eq!(format_number(&Number::Float(f64::INFINITY)), "null");
        assert_eq!(format_number(&Number::Float(f64::NEG_INFINITY)), "null");
    }

    #[rstest::rstest]
    #[case("0", true)]
    #[case("42", true)]
    #[case("-42", true)]
    #[case("3.14", true)]
    #[case("-0.5", true)]
    #[case("1e5", true)]
    #[case("1.2e-3", true)]
    #[case("0123", true)]
    #[case("", false)]
    #[case("-", false)]
    #[case(".5", false)]
    #[case("5.", false)]
    #[case("1e", false)]
    #[case("NaN", false)]
    #[case("Infinity", false)]
    #[case("1 2", false)]
    #[case("0x10", false)]
    fn test_is_numeric_like(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(is_numeric_like(token), expected);
    }

    #[rstest::rstest]
    fn test_parse_number_kinds() {
        assert_eq!(parse_number("42"), Some(Number::PosInt(42)));
        assert_eq!(parse_number("-42"), Some(Number::NegInt(-42)));
        assert_eq!(parse_number("2.5"), Some(Number::Float(2.5)));
        assert_eq!(parse_number("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(
            parse_number("18446744073709551615"),
            Some(Number::PosInt(u64::MAX))
        );
        assert_eq!(parse_number("hello"), None);
        assert_eq!(parse_number("NaN"), None);
    }
}
