//! [`Area`]-related definitions.

use std::{fmt, iter, ops, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};

/// Non-negative surface area, in square meters, not exceeding [`Area::MAX`].
///
/// Keeps the full [`Decimal`] precision. Rounding to two decimal places is
/// only applied for presentation via [`Area::rounded()`].
///
/// Summing [`Area`]s saturates at [`Decimal::MAX`] instead of overflowing.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Area(Decimal);

impl Area {
    /// Empty [`Area`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Greatest accepted [`Area`]: a million square kilometers.
    pub const MAX: Self =
        Self(Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0));

    /// Creates a new [`Area`] if the provided value is not negative and
    /// doesn't exceed [`Area::MAX`].
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        ((!val.is_sign_negative() || val.is_zero()) && val <= Self::MAX.0)
            .then_some(Self(val))
    }

    /// Creates a new [`Area`] if the provided value is strictly positive and
    /// doesn't exceed [`Area::MAX`].
    #[must_use]
    pub fn positive(val: Decimal) -> Option<Self> {
        Self::new(val).filter(|a| !a.is_zero())
    }

    /// Returns the underlying [`Decimal`] value.
    #[must_use]
    pub fn decimal(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Area`] is empty.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Divides this [`Area`] into `parts` equal shares, returning one share.
    ///
    /// [`None`] is returned if `parts` is zero.
    #[must_use]
    pub fn share(self, parts: usize) -> Option<Self> {
        if parts == 0 {
            return None;
        }
        self.0.checked_div(Decimal::from(parts)).map(Self)
    }

    /// Subtracts the `other` [`Area`] from this one.
    ///
    /// [`None`] is returned if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).and_then(Self::new)
    }

    /// Returns the absolute difference between this [`Area`] and the `other`
    /// one.
    #[must_use]
    pub fn abs_diff(self, other: Self) -> Decimal {
        (self.0 - other.0).abs()
    }

    /// Indicates whether this [`Area`] equals the `other` one within the
    /// provided `tolerance`.
    #[must_use]
    pub fn approx_eq(self, other: Self, tolerance: Decimal) -> bool {
        self.abs_diff(other) <= tolerance
    }

    /// Returns this [`Area`] rounded to two decimal places for presentation.
    #[must_use]
    pub fn rounded(self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Area {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::new)
            .ok_or("invalid area value")
    }
}

impl TryFrom<Decimal> for Area {
    type Error = &'static str;

    fn try_from(val: Decimal) -> Result<Self, Self::Error> {
        Self::new(val).ok_or("area value is negative or too large")
    }
}

impl ops::Add for Area {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl ops::AddAssign for Area {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl iter::Sum for Area {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, ops::Add::add)
    }
}

impl<'a> iter::Sum<&'a Area> for Area {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Surface area in square meters, as a decimal string (e.g. `"112.5"`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Area = super::Area;

    impl Area {
        fn to_output<S: ScalarValue>(a: &Area) -> Value<S> {
            Value::scalar(a.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Area` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Area` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Area;

    fn area(s: &str) -> Area {
        Area::from_str(s).unwrap()
    }

    #[test]
    fn rejects_negative() {
        assert!(Area::from_str("-1").is_err());
        assert!(Area::from_str("abc").is_err());
        assert_eq!(Area::from_str("0").unwrap(), Area::ZERO);
        assert!(Area::positive(Decimal::ZERO).is_none());
        assert!(Area::positive(Decimal::ONE).is_some());
    }

    #[test]
    fn rejects_above_max() {
        assert_eq!(Area::from_str("1000000000000").unwrap(), Area::MAX);
        assert!(Area::from_str("1000000000000.01").is_err());
        assert!(Area::from_str("5e28").is_err());
        assert!(Area::positive(Decimal::MAX).is_none());
    }

    #[test]
    fn saturates_sum() {
        let huge = Area(Decimal::MAX / Decimal::TWO);

        let total: Area = [huge, huge, huge].iter().sum();
        assert_eq!(total.decimal(), Decimal::MAX);

        let mut acc = Area::MAX;
        acc += huge;
        acc += huge;
        assert_eq!(acc.decimal(), Decimal::MAX);
    }

    #[test]
    fn shares_equally() {
        assert_eq!(area("300").share(3), Some(area("100")));
        assert_eq!(area("300").share(0), None);

        let share = area("100").share(3).unwrap();
        let total: Area = [share, share, share].iter().sum();
        assert!(total.approx_eq(area("100"), Decimal::new(1, 2)));
        assert_ne!(total, area("100"));
    }

    #[test]
    fn subtracts_without_going_negative() {
        assert_eq!(area("300").checked_sub(area("60")), Some(area("240")));
        assert_eq!(area("60").checked_sub(area("60")), Some(Area::ZERO));
        assert_eq!(area("60").checked_sub(area("60.01")), None);
    }

    #[test]
    fn rounds_for_presentation_only() {
        let share = area("100").share(3).unwrap();
        assert_eq!(share.rounded(), Decimal::from_str("33.33").unwrap());
        assert_ne!(share.decimal(), share.rounded());
        assert_eq!(area("0.125").rounded(), Decimal::from_str("0.13").unwrap());
    }

    #[test]
    fn displays_normalized() {
        assert_eq!(area("100.500").to_string(), "100.5");
        assert_eq!(area("12").to_string(), "12");
    }
}
