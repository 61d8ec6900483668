use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// Raw units per dollar. One unit is 1/10000 of a dollar.
pub const PRICE_SCALE: u64 = 10_000;

/// Unsigned fixed-point USD price with 4 decimal places.
///
/// All arithmetic is wrapping and unchecked. A wrapped subtraction produces a
/// huge raw value, which is the intended fail-fast signal for a logic error;
/// ordering and equality stay exact because the representation is integral.
///
/// `repr(transparent)` keeps `Price` layout-identical to `u64`, so it can be
/// stored in an `AtomicU64` slot field or a fixed wire record byte for byte.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);
    /// Smallest representable increment (1/10000 dollar).
    pub const TICK: Price = Price(1);
    pub const ONE_DOLLAR: Price = Price(PRICE_SCALE);

    #[inline(always)]
    pub const fn from_raw(raw: u64) -> Self {
        Price(raw)
    }

    /// Converts dollars to fixed point, truncating toward zero.
    #[inline(always)]
    pub fn from_dollars(dollars: f64) -> Self {
        Price((dollars * PRICE_SCALE as f64) as u64)
    }

    #[inline(always)]
    pub const fn raw(self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub fn dollars(self) -> f64 {
        self.0 as f64 / PRICE_SCALE as f64
    }

    #[inline(always)]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Absolute difference, always well defined even when `other > self`.
    #[inline(always)]
    pub const fn abs_diff(self, other: Price) -> Price {
        Price(self.0.abs_diff(other.0))
    }
}

impl Add for Price {
    type Output = Price;

    #[inline(always)]
    fn add(self, rhs: Price) -> Price {
        Price(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Price {
    type Output = Price;

    #[inline(always)]
    fn sub(self, rhs: Price) -> Price {
        Price(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul<u64> for Price {
    type Output = Price;

    #[inline(always)]
    fn mul(self, rhs: u64) -> Price {
        Price(self.0.wrapping_mul(rhs))
    }
}

impl Div<u64> for Price {
    type Output = Price;

    #[inline(always)]
    fn div(self, rhs: u64) -> Price {
        Price(self.0 / rhs)
    }
}

impl AddAssign for Price {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Price) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl SubAssign for Price {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Price) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl MulAssign<u64> for Price {
    #[inline(always)]
    fn mul_assign(&mut self, rhs: u64) {
        self.0 = self.0.wrapping_mul(rhs);
    }
}

impl DivAssign<u64> for Price {
    #[inline(always)]
    fn div_assign(&mut self, rhs: u64) {
        self.0 /= rhs;
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.dollars())
    }
}
