//! Fixed-point amounts.
//!
//! Resource balances and troop counts are fixed-point integers scaled by
//! [`PRECISION`] sub-units per whole unit, matching the authoritative chain
//! arithmetic exactly. All conversions are explicit; there are no `From`
//! impls for primitive integers, so a raw sub-unit count can never be
//! mistaken for a whole-unit count at a call site.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Sub-units per whole resource/troop unit.
pub const PRECISION: i128 = 1_000;

// ---------------------------------------------------------------------------
// Fixed
// ---------------------------------------------------------------------------

/// A fixed-point amount, [`PRECISION`] sub-units per whole unit.
///
/// Signed so that intermediate arithmetic (net rates, deltas) can go
/// negative; stored balances are clamped non-negative by the engines.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Fixed(i128);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);

    /// `units` whole units.
    #[inline]
    pub fn from_units(units: i128) -> Self {
        Self(units * PRECISION)
    }

    /// Wrap a raw sub-unit count.
    #[inline]
    pub fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Raw sub-unit count.
    #[inline]
    pub fn raw(self) -> i128 {
        self.0
    }

    /// Whole units, rounded toward negative infinity.
    #[inline]
    pub fn to_units(self) -> i128 {
        self.0.div_euclid(PRECISION)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `self - rhs`, floored at zero.
    #[inline]
    pub fn saturating_sub_at_zero(self, rhs: Fixed) -> Fixed {
        Fixed((self.0 - rhs.0).max(0))
    }

    /// Multiply by a plain integer (tick counts, troop units).
    #[inline]
    pub fn mul_int(self, n: i128) -> Fixed {
        Fixed(self.0 * n)
    }

    /// Divide by a plain integer, rounding toward negative infinity.
    #[inline]
    pub fn div_int(self, n: i128) -> Fixed {
        Fixed(self.0.div_euclid(n))
    }

    /// How many whole multiples of `rhs` fit in `self`.
    ///
    /// Used for budget math ("how many steps can this food balance pay
    /// for"). Returns `i128::MAX` when `rhs` is zero, i.e. a free step never
    /// bounds the budget.
    pub fn div_floor(self, rhs: Fixed) -> i128 {
        if rhs.0 == 0 {
            return i128::MAX;
        }
        self.0.div_euclid(rhs.0)
    }

    /// `floor(self * num / den)`.
    ///
    /// The multiplication is done in `i128`; callers keep `num`/`den` within
    /// the health/tick ranges where this cannot overflow.
    pub fn scale_by_ratio(self, num: i128, den: i128) -> Fixed {
        Fixed((self.0 * num).div_euclid(den))
    }

    /// Round down to the nearest whole unit, keeping the fixed-point scale.
    #[inline]
    pub fn floor_unit(self) -> Fixed {
        Fixed(self.0.div_euclid(PRECISION) * PRECISION)
    }

    #[inline]
    pub fn min(self, other: Fixed) -> Fixed {
        Fixed(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Fixed) -> Fixed {
        Fixed(self.0.max(other.0))
    }
}

impl Add for Fixed {
    type Output = Fixed;
    #[inline]
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 + rhs.0)
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    #[inline]
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0 - rhs.0)
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    #[inline]
    fn neg(self) -> Fixed {
        Fixed(-self.0)
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 -= rhs.0;
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.0)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0.div_euclid(PRECISION);
        let frac = self.0.rem_euclid(PRECISION);
        write!(f, "{whole}.{frac:03}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
