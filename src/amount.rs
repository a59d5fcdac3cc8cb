use std::fmt;
use std::iter;

/// A dollar-side figure, displayed with en-US grouping and two decimals (`1,234.50`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    pub fn from_float(value: f64) -> Self {
        Amount(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.0.is_finite() {
            return write_non_finite(f, self.0);
        }
        let cents = round_cents(self.0.abs());
        let (whole, frac) = cents.split_at(cents.len() - 2);
        // a value that rounds to zero prints without a sign
        let sign = if self.0 < 0.0 && cents.bytes().any(|d| d != b'0') { "-" } else { "" };
        write!(f, "{sign}{}.{frac}", group_thousands(whole))
    }
}

/// A won-side figure, rounded half up to a whole number and comma grouped (`4,950`).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Won(f64);

impl Won {
    pub fn from_float(value: f64) -> Self {
        Won(value)
    }

    /// Round half towards positive infinity, so `2.5 -> 3` and `-2.5 -> -2`.
    pub fn rounded(self) -> f64 {
        (self.0 + 0.5).floor()
    }
}

impl fmt::Display for Won {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.0.is_finite() {
            return write_non_finite(f, self.0);
        }
        let rounded = self.rounded();
        let sign = if rounded < 0.0 { "-" } else { "" };
        // f64 display never switches to exponent notation
        let digits = rounded.abs().to_string();
        write!(f, "{sign}{}", group_thousands(&digits))
    }
}

fn write_non_finite(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    match value {
        v if v.is_nan() => f.write_str("NaN"),
        v if v > 0.0 => f.write_str("∞"),
        _ => f.write_str("-∞"),
    }
}

/// Digits of `value` scaled to cents.
///
/// Rounds the shortest decimal form of `value`, ties away from zero, so
/// `1.005` gives `101` even though its binary value is slightly below.
fn round_cents(value: f64) -> String {
    let shortest = value.to_string();
    let (whole, frac) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut digits: Vec<u8> = whole
        .bytes()
        .chain(frac.bytes().chain(iter::repeat(b'0')).take(2))
        .collect();

    if frac.as_bytes().get(2).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }

    // at least one whole digit, so there are always three or more
    digits.into_iter().map(char::from).collect()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
