//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute of string-like
/// scalars wrapping a domain type.
///
/// The wrapped `As` type is written with its [`Display`] impl and read with its
/// [`FromStr`] one, so validation rules of the domain apply to every input.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the scalar into a string [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Parses the scalar out of a string [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the input value is not a string, or the domain rejects it.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr,
        As::Err: fmt::Display,
        T: From<As> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let s = input.as_string_value().ok_or_else(|| {
            invalid::<T, S>(format_args!("expected string, found: {input}"))
        })?;
        s.parse::<As>()
            .map(T::from)
            .map_err(|e| invalid::<T, S>(format_args!("\"{s}\": {e}")))
    }

    /// Parses the provided [`ScalarToken`] as a string.
    ///
    /// # Errors
    ///
    /// If the token is not a string.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Formats an error message of an invalid input of the `T` scalar.
fn invalid<T, S>(details: fmt::Arguments<'_>) -> String
where
    T: GraphQLType<S, TypeInfo = ()>,
    S: ScalarValue,
{
    format!(
        "Invalid `{}` scalar {details}",
        T::name(&()).unwrap_or("anonymous"),
    )
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};
    use service::domain;

    use crate::api;

    use super::Via;

    #[test]
    fn parses_through_domain_type() {
        let label = Via::<domain::unit::Label>::from_input::<
            api::unit::Label,
            DefaultScalarValue,
        >(&InputValue::scalar("302"))
        .unwrap();

        assert_eq!(label.to_string(), "302");
    }

    #[test]
    fn reports_rejected_input() {
        let err = Via::<domain::unit::Label>::from_input::<
            api::unit::Label,
            DefaultScalarValue,
        >(&InputValue::scalar(" 302"))
        .unwrap_err();
        assert!(err.starts_with("Invalid `UnitLabel` scalar \" 302\""), "{err}");

        let err = Via::<domain::unit::Label>::from_input::<
            api::unit::Label,
            DefaultScalarValue,
        >(&InputValue::scalar(302))
        .unwrap_err();
        assert!(err.contains("expected string"), "{err}");
    }
}
