//! `Quantity`: Exact Kubernetes resource quantities
//!
//! `k8s-openapi` carries quantities as opaque strings. Capacity matching needs
//! numeric comparison that ignores notation (`10Gi` equals `10737418240`), so
//! this module parses the Kubernetes quantity grammar into an exact count of
//! nano-units.
//!
//! ```text
//! <quantity>        ::= <sign><number><suffix>
//! <number>          ::= <digits> | <digits>.<digits> | <digits>. | .<digits>
//! <suffix>          ::= <binarySI> | <decimalExponent> | <decimalSI>
//! <binarySI>        ::= Ki | Mi | Gi | Ti | Pi | Ei
//! <decimalSI>       ::= n | u | m | "" | k | M | G | T | P | E
//! <decimalExponent> ::= e<signedInt> | E<signedInt>
//! ```

use crate::{PolicyError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Nano-units per whole unit.
const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// Decimal exponent of one nano-unit.
const NANO_EXPONENT: i64 = 9;

/// A resource quantity such as `10Gi`, `500M` or `100m`.
///
/// Equality, ordering and hashing use the numeric value only, so two
/// quantities written with different suffixes compare equal when they denote
/// the same amount.
///
/// # Example
///
/// ```
/// use volmatch::Quantity;
///
/// let binary: Quantity = "10Gi".parse().unwrap();
/// let plain: Quantity = "10737418240".parse().unwrap();
/// assert_eq!(binary, plain);
/// assert!(binary > "10G".parse::<Quantity>().unwrap());
/// ```
#[derive(Clone, Default)]
pub struct Quantity {
    nanos: i128,
    /// Notation the quantity was parsed from, kept for display.
    repr: Option<String>,
}

impl Quantity {
    /// The zero quantity.
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A quantity of `bytes` whole units.
    #[must_use]
    pub fn from_bytes(bytes: i64) -> Self {
        Self {
            nanos: i128::from(bytes) * NANOS_PER_UNIT,
            repr: None,
        }
    }

    /// Returns `true` if this quantity is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    /// The exact value in nano-units.
    #[must_use]
    pub fn as_nanos(&self) -> i128 {
        self.nanos
    }
}

impl FromStr for Quantity {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| PolicyError::InvalidQuantity {
            input: s.to_owned(),
            reason: reason.to_owned(),
        };

        if s.is_empty() {
            return Err(invalid("empty quantity"));
        }

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };

        let split = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(split);

        let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("missing digits"));
        }
        if frac_part.contains('.') {
            return Err(invalid("malformed number"));
        }

        let (shift, exponent) = parse_suffix(suffix)
            .ok_or_else(|| invalid(&format!("unknown suffix `{suffix}`")))?;

        // Fraction digits past this position weigh less than one nano-unit in
        // total, and the kept prefix sits on a grid containing every whole
        // nano-unit, so they only decide whether to round up.
        let precise_digits = exponent
            .saturating_add(NANO_EXPONENT)
            .saturating_add(i64::from(shift))
            .max(0);
        let kept_len = usize::try_from(precise_digits)
            .map_or(frac_part.len(), |n| n.min(frac_part.len()));
        let (kept, dropped) = frac_part.split_at(kept_len);
        let kept = kept.trim_end_matches('0');
        let sticky = dropped.bytes().any(|b| b != b'0');

        let mut mantissa: i128 = 0;
        for digit in int_part.bytes() {
            mantissa = push_digit(mantissa, digit).ok_or_else(|| invalid("value out of range"))?;
        }
        for digit in kept.bytes() {
            mantissa =
                push_digit(mantissa, digit).ok_or_else(|| invalid("too many significant digits"))?;
        }

        let frac_digits =
            i64::try_from(kept.len()).map_err(|_| invalid("too many significant digits"))?;
        let power = exponent
            .checked_add(NANO_EXPONENT)
            .and_then(|e| e.checked_sub(frac_digits))
            .ok_or_else(|| invalid("value out of range"))?;
        let scaled = mantissa
            .checked_mul(1_i128 << shift)
            .ok_or_else(|| invalid("value out of range"))?;
        let (magnitude, rounded) =
            scale_by_power_of_ten(scaled, power).ok_or_else(|| invalid("value out of range"))?;
        let magnitude = if sticky && !rounded {
            magnitude
                .checked_add(1)
                .ok_or_else(|| invalid("value out of range"))?
        } else {
            magnitude
        };

        Ok(Self {
            nanos: if negative { -magnitude } else { magnitude },
            repr: Some(s.to_owned()),
        })
    }
}

/// Maps a suffix to `(binary shift, decimal exponent)`.
fn parse_suffix(suffix: &str) -> Option<(u32, i64)> {
    let scale = match suffix {
        "Ki" => (10, 0),
        "Mi" => (20, 0),
        "Gi" => (30, 0),
        "Ti" => (40, 0),
        "Pi" => (50, 0),
        "Ei" => (60, 0),
        "n" => (0, -9),
        "u" => (0, -6),
        "m" => (0, -3),
        "" => (0, 0),
        "k" => (0, 3),
        "M" => (0, 6),
        "G" => (0, 9),
        "T" => (0, 12),
        "P" => (0, 15),
        "E" => (0, 18),
        _ => {
            let exponent = suffix.strip_prefix(|c: char| c == 'e' || c == 'E')?;
            let digits = exponent
                .strip_prefix(|c: char| c == '+' || c == '-')
                .unwrap_or(exponent);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            (0, exponent.parse::<i64>().ok()?)
        }
    };
    Some(scale)
}

fn push_digit(mantissa: i128, digit: u8) -> Option<i128> {
    mantissa
        .checked_mul(10)?
        .checked_add(i128::from(digit - b'0'))
}

/// Multiplies a non-negative `value` by `10^power`, rounding fractions up.
///
/// Returns the result and whether it was rounded, or `None` on overflow.
fn scale_by_power_of_ten(value: i128, power: i64) -> Option<(i128, bool)> {
    if power >= 0 {
        let factor = 10_i128.checked_pow(u32::try_from(power).ok()?)?;
        return Some((value.checked_mul(factor)?, false));
    }
    let divisor = u32::try_from(power.unsigned_abs())
        .ok()
        .and_then(|p| 10_i128.checked_pow(p));
    Some(match divisor {
        Some(d) => {
            let rounded = value % d != 0;
            (value / d + i128::from(rounded), rounded)
        }
        // Smaller than one nano-unit: any non-zero amount rounds up to one.
        None => (i128::from(value != 0), value != 0),
    })
}

impl TryFrom<&k8s_openapi::apimachinery::pkg::api::resource::Quantity> for Quantity {
    type Error = PolicyError;

    fn try_from(
        value: &k8s_openapi::apimachinery::pkg::api::resource::Quantity,
    ) -> Result<Self> {
        value.0.parse()
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.nanos.cmp(&other.nanos)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nanos.hash(state);
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Some(repr) => f.write_str(repr),
            None if self.nanos % NANOS_PER_UNIT == 0 => {
                write!(f, "{}", self.nanos / NANOS_PER_UNIT)
            }
            None => write!(f, "{}n", self.nanos),
        }
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({self})")
    }
}
