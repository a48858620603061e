//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::Area;

/// Non-negative percentage.
///
/// Not bounded by `100`, as a ratio of executed to contracted work may
/// legitimately overflow it.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub struct Percent(Decimal);

impl Percent {
    /// Zero [`Percent`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Percent`] by checking the provided value is not
    /// negative.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (val >= Decimal::ZERO).then_some(Self(val))
    }

    /// Calculates the [`Percent`] the `part` constitutes of the `whole`,
    /// rounded to two decimal places.
    ///
    /// Returns [`Percent::ZERO`] if the `whole` is empty, and saturates at
    /// [`Decimal::MAX`] if the ratio is too large to be represented.
    #[must_use]
    pub fn of(part: Area, whole: Area) -> Self {
        if whole.is_zero() {
            return Self::ZERO;
        }
        let ratio = part
            .decimal()
            .checked_div(whole.decimal())
            .map_or(Decimal::MAX, |r| r.saturating_mul(Decimal::ONE_HUNDRED));
        Self(
            ratio
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
                .normalize(),
        )
    }

    /// Returns the underlying [`Decimal`] value.
    #[must_use]
    pub fn decimal(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Percent`] exceeds `100`.
    #[must_use]
    pub fn is_overflown(self) -> bool {
        self.0 > Decimal::ONE_HUNDRED
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative percentage with up to two decimal places.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}
