//! `Capacity`: Inclusive range over storage quantities
//!
//! Configured as `"<lower>,<upper>"`. Either side may be empty, which parses
//! to zero. Zero carries meaning at evaluation time:
//!
//! | lower | upper | matches |
//! |-------|-------|---------|
//! | 0 | 0 | any capacity |
//! | L | 0 | capacity ≥ L |
//! | L | U | L ≤ capacity ≤ U |

use crate::{PolicyError, Quantity, Result};
use std::fmt;

/// An inclusive capacity range.
///
/// # Example
///
/// ```
/// use volmatch::{Capacity, Quantity};
///
/// let range = Capacity::parse("10Gi,20Gi").unwrap();
/// assert!(range.is_in_range(&"15Gi".parse::<Quantity>().unwrap()));
/// assert!(!range.is_in_range(&"25Gi".parse::<Quantity>().unwrap()));
///
/// let open = Capacity::parse("10Gi,").unwrap();
/// assert!(open.is_in_range(&"1Ti".parse::<Quantity>().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capacity {
    lower: Quantity,
    upper: Quantity,
}

impl Capacity {
    /// Create a range from explicit bounds.
    ///
    /// A zero `upper` leaves the range open above; zero on both sides leaves
    /// it unconstrained.
    #[must_use]
    pub fn new(lower: Quantity, upper: Quantity) -> Self {
        Self { lower, upper }
    }

    /// Parse a `"<lower>,<upper>"` capacity string.
    ///
    /// An empty string is the unconstrained range.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::CapacityFormat`] unless the input holds exactly
    /// one comma, and [`PolicyError::InvalidQuantity`] if a side is not a
    /// valid quantity.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::default());
        }

        let Some((lower, upper)) = text.split_once(',') else {
            return Err(PolicyError::CapacityFormat {
                input: text.to_owned(),
            });
        };
        if upper.contains(',') {
            return Err(PolicyError::CapacityFormat {
                input: text.to_owned(),
            });
        }

        Ok(Self {
            lower: parse_bound(lower)?,
            upper: parse_bound(upper)?,
        })
    }

    /// The lower bound.
    #[must_use]
    pub fn lower(&self) -> &Quantity {
        &self.lower
    }

    /// The upper bound (zero when open).
    #[must_use]
    pub fn upper(&self) -> &Quantity {
        &self.upper
    }

    /// Returns `true` if both bounds are zero.
    #[must_use]
    pub fn is_unconstrained(&self) -> bool {
        self.lower.is_zero() && self.upper.is_zero()
    }

    /// Returns `true` if `quantity` falls inside this range.
    #[must_use]
    pub fn is_in_range(&self, quantity: &Quantity) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        if self.upper.is_zero() {
            return self.lower <= *quantity;
        }
        self.lower <= *quantity && *quantity <= self.upper
    }
}

fn parse_bound(side: &str) -> Result<Quantity> {
    let side = side.trim();
    if side.is_empty() {
        Ok(Quantity::zero())
    } else {
        side.parse()
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.upper.is_zero() {
            write!(f, "{},", self.lower)
        } else {
            write!(f, "{},{}", self.lower, self.upper)
        }
    }
}
