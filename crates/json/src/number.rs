//! Exact decimal numbers.
//!
//! A JSON number literal is kept as `sign × digits × 10^exponent`, normalized so that
//! numerically equal literals (`1`, `1.0`, `10e-1`, `0.1E1`) compare equal and render
//! identically. Nothing is rounded until `to_f64` is asked for.

use std::fmt;
use std::str::FromStr;

use crate::parse::{ParseError, ParseErrorKind};

/// Largest decimal-point position still rendered without an exponent.
const MAX_PLAIN_POINT: i128 = 21;
/// Smallest decimal-point position still rendered without an exponent.
const MIN_PLAIN_POINT: i128 = -5;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    negative: bool,
    /// Significant digits, no leading or trailing zeros. Empty means zero.
    digits: String,
    /// Wider than the literal's exponent so normalizing `int.frac e exp` never overflows.
    exponent: i128,
}

impl Number {
    pub fn zero() -> Self {
        Self { negative: false, digits: String::new(), exponent: 0 }
    }

    /// Build from raw parts: `int_digits.frac_digits × 10^exp`.
    fn from_parts(negative: bool, int_digits: &str, frac_digits: &str, exp: i64) -> Self {
        let mut digits = String::with_capacity(int_digits.len() + frac_digits.len());
        digits.push_str(int_digits);
        digits.push_str(frac_digits);

        let trimmed_lead = digits.trim_start_matches('0').len();
        digits.drain(..digits.len() - trimmed_lead);
        let trimmed = digits.trim_end_matches('0').len();
        let trailing = (digits.len() - trimmed) as i128;
        digits.truncate(trimmed);

        if digits.is_empty() {
            return Self::zero();
        }
        let exponent = i128::from(exp) - frac_digits.len() as i128 + trailing;
        Self { negative, digits, exponent }
    }

    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// True when the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0
    }

    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        self.to_string().parse().ok()
    }

    pub fn as_u64(&self) -> Option<u64> {
        if !self.is_integer() || self.negative {
            return None;
        }
        self.to_string().parse().ok()
    }

    /// Nearest `f64`. Magnitudes past the finite range come back infinite,
    /// magnitudes below the subnormal range come back as zero.
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let sign = if self.negative { "-" } else { "" };
        let literal = format!("{sign}{}e{}", self.digits, self.exponent);
        // The literal is always well formed; std parsing rounds correctly and saturates.
        literal.parse().unwrap_or(f64::NAN)
    }

    /// Shortest decimal that round-trips to `value`. `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        format!("{value:e}").parse().ok()
    }

    /// Write the canonical form into `out`.
    pub(crate) fn write_canonical(&self, out: &mut String) {
        if self.is_zero() {
            out.push('0');
            return;
        }
        if self.negative {
            out.push('-');
        }

        let k = self.digits.len() as i128;
        let point = k + self.exponent;

        if k <= point && point <= MAX_PLAIN_POINT {
            out.push_str(&self.digits);
            push_zeros(out, point - k);
        } else if 0 < point && point <= MAX_PLAIN_POINT {
            let (int_part, frac_part) = self.digits.split_at(point as usize);
            out.push_str(int_part);
            out.push('.');
            out.push_str(frac_part);
        } else if MIN_PLAIN_POINT <= point && point <= 0 {
            out.push_str("0.");
            push_zeros(out, -point);
            out.push_str(&self.digits);
        } else {
            let (head, tail) = self.digits.split_at(1);
            out.push_str(head);
            if !tail.is_empty() {
                out.push('.');
                out.push_str(tail);
            }
            let e = point - 1;
            out.push('e');
            out.push(if e < 0 { '-' } else { '+' });
            out.push_str(&e.unsigned_abs().to_string());
        }
    }
}

fn is_all_zeros(digits: &str) -> bool {
    digits.bytes().all(|b| b == b'0')
}

fn push_zeros(out: &mut String, count: i128) {
    for _ in 0..count {
        out.push('0');
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::new();
        self.write_canonical(&mut s);
        f.write_str(&s)
    }
}

impl FromStr for Number {
    type Err = ParseError;

    /// Parse a complete JSON number literal (no surrounding whitespace).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut scanner = NumberScanner { bytes: s.as_bytes(), pos: 0 };
        let n = scanner.scan(s)?;
        if scanner.pos != s.len() {
            return Err(ParseError::new(scanner.pos, ParseErrorKind::InvalidNumber));
        }
        Ok(n)
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        let digits = v.unsigned_abs().to_string();
        Self::from_parts(v < 0, &digits, "", 0)
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        Self::from_parts(false, &v.to_string(), "", 0)
    }
}

/// Scans the number grammar `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`.
struct NumberScanner<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl NumberScanner<'_> {
    fn scan(&mut self, text: &str) -> Result<Number, ParseError> {
        let start = self.pos;
        let negative = self.eat(b'-');

        let int_start = self.pos;
        match self.peek() {
            Some(b'0') => self.pos += 1,
            Some(b'1'..=b'9') => self.eat_digits(),
            _ => return Err(self.invalid()),
        }
        let int_digits = &text[int_start..self.pos];
        if int_digits == "0" && matches!(self.peek(), Some(b'0'..=b'9')) {
            return Err(self.invalid());
        }

        let mut frac_digits = "";
        if self.eat(b'.') {
            let frac_start = self.pos;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.invalid());
            }
            self.eat_digits();
            frac_digits = &text[frac_start..self.pos];
        }

        let mut exp: i64 = 0;
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.pos += 1;
            let exp_negative = if self.eat(b'-') {
                true
            } else {
                self.eat(b'+');
                false
            };
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(self.invalid());
            }
            // Zero stays zero whatever the exponent.
            if is_all_zeros(int_digits) && is_all_zeros(frac_digits) {
                self.eat_digits();
                return Ok(Number::zero());
            }
            while let Some(d @ b'0'..=b'9') = self.peek() {
                let digit = i64::from(d - b'0');
                let shifted = exp.checked_mul(10);
                let step = if exp_negative {
                    shifted.and_then(|e| e.checked_sub(digit))
                } else {
                    shifted.and_then(|e| e.checked_add(digit))
                };
                exp = step.ok_or_else(|| ParseError::new(start, ParseErrorKind::InvalidNumber))?;
                self.pos += 1;
            }
        }

        Ok(Number::from_parts(negative, int_digits, frac_digits, exp))
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
    }

    fn invalid(&self) -> ParseError {
        ParseError::new(self.pos, ParseErrorKind::InvalidNumber)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn canon(s: &str) -> String {
        s.parse::<Number>().unwrap().to_string()
    }

    #[test_case("0", "0")]
    #[test_case("-0", "0")]
    #[test_case("0.000", "0")]
    #[test_case("1", "1")]
    #[test_case("-17", "-17")]
    #[test_case("1.0", "1")]
    #[test_case("1.50", "1.5")]
    #[test_case("10e-1", "1")]
    #[test_case("0.1E1", "1")]
    #[test_case("1e2", "100")]
    #[test_case("1E+2", "100")]
    #[test_case("123.456", "123.456")]
    #[test_case("0.001", "0.001")]
    #[test_case("0.000001", "0.000001")]
    #[test_case("0.0000001", "1e-7")]
    #[test_case("1e20", "100000000000000000000")]
    #[test_case("1e21", "1e+21")]
    #[test_case("12345e30", "1.2345e+34")]
    #[test_case("-2.5e-10", "-2.5e-10")]
    #[test_case("9007199254740993", "9007199254740993")]
    #[test_case("123456789012345678901234567890", "1.2345678901234567890123456789e+29")]
    #[test_case("1e400", "1e+400")]
    #[test_case("0e99999999999999999999", "0")]
    #[test_case("-0.000E-99999999999999999999", "0")]
    #[test_case("10e9223372036854775807", "1e+9223372036854775808")]
    #[test_case("0.1e-9223372036854775808", "1e-9223372036854775809")]
    fn canonical_rendering(input: &str, expected: &str) {
        assert_eq!(canon(input), expected);
    }

    #[test_case("01")]
    #[test_case("-")]
    #[test_case("1.")]
    #[test_case(".5")]
    #[test_case("+1")]
    #[test_case("1e")]
    #[test_case("1e+")]
    #[test_case("0x10")]
    #[test_case("1e99999999999999999999")]
    fn rejects_invalid_literals(input: &str) {
        let err = input.parse::<Number>().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidNumber);
    }

    #[test]
    fn equal_values_compare_equal() {
        let a: Number = "100".parse().unwrap();
        let b: Number = "1.00e2".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_form_is_a_fixed_point() {
        for s in ["1e-7", "1.2345e+34", "0.5", "-3", "1e+400"] {
            assert_eq!(canon(&canon(s)), canon(s));
        }
    }

    #[test]
    fn f64_projection() {
        assert_eq!("0.1".parse::<Number>().unwrap().to_f64(), 0.1);
        assert_eq!("-2.5e3".parse::<Number>().unwrap().to_f64(), -2500.0);
        // 2^53 + 1 is not representable; rounds to even.
        assert_eq!("9007199254740993".parse::<Number>().unwrap().to_f64(), 9007199254740992.0);
        assert!("1e400".parse::<Number>().unwrap().to_f64().is_infinite());
        assert_eq!("1e-400".parse::<Number>().unwrap().to_f64(), 0.0);
        assert!("10e9223372036854775807".parse::<Number>().unwrap().to_f64().is_infinite());
    }

    #[test]
    fn from_f64_is_shortest_roundtrip() {
        assert_eq!(Number::from_f64(0.75).unwrap().to_string(), "0.75");
        assert_eq!(Number::from_f64(0.1 + 0.2).unwrap().to_string(), "0.30000000000000004");
        assert_eq!(Number::from_f64(1e300).unwrap().to_string(), "1e+300");
        assert_eq!(Number::from_f64(-0.0).unwrap().to_string(), "0");
        assert!(Number::from_f64(f64::NAN).is_none());
        assert!(Number::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn integer_accessors() {
        assert_eq!("1e3".parse::<Number>().unwrap().as_i64(), Some(1000));
        assert_eq!("-5".parse::<Number>().unwrap().as_u64(), None);
        assert_eq!("1.5".parse::<Number>().unwrap().as_i64(), None);
        assert_eq!(Number::from(-42i64).to_string(), "-42");
        assert_eq!(Number::from(u64::MAX).as_u64(), Some(u64::MAX));
    }
}
