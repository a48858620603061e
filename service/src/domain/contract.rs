//! [`Contract`] definitions.

use std::{collections::BTreeMap, sync::LazyLock};

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, marker, Area, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Development;
use crate::domain::{development, unit, Notes};

/// Flooring or tiling service agreement over a [`Development`].
#[derive(Clone, Debug)]
pub struct Contract {
    /// ID of this [`Contract`].
    pub id: Id,

    /// Globally unique [`Number`] of this [`Contract`].
    pub number: Number,

    /// ID of the [`Development`] this [`Contract`] is executed in.
    pub development_id: development::Id,

    /// [`ServiceType`] of this [`Contract`].
    pub service_type: ServiceType,

    /// Total value of this [`Contract`].
    pub total_value: Money,

    /// Value of a single square meter, if agreed.
    pub value_per_area: Option<Money>,

    /// Total contracted [`Area`].
    pub total_area: Area,

    /// Contracted [`Area`] of each floor.
    pub area_by_floor: AreaByFloor,

    /// [`Status`] of this [`Contract`].
    pub status: Status,

    /// [`Notes`] about this [`Contract`], if any.
    pub notes: Option<Notes>,

    /// [`Date`] when the work starts, if planned.
    pub starts_on: Option<Date>,

    /// [`Date`] when the work is expected to end, if planned.
    pub expected_end_on: Option<Date>,

    /// [`DateTime`] when this [`Contract`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Contract`] was modified last time.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`Contract`] was deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Contract {
    /// Indicates whether this [`Contract`] is deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Returns the difference between [`Contract::total_area`] and the sum of
    /// [`Contract::area_by_floor`], if they diverge.
    #[must_use]
    pub fn floors_mismatch(&self) -> Option<Decimal> {
        let floors = self.area_by_floor.total();
        (floors != self.total_area).then(|| {
            self.total_area.decimal() - floors.decimal()
        })
    }
}

/// ID of a [`Contract`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// External reference number of a [`Contract`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Number`] format.
        ///
        /// - Must not start or end with a whitespace;
        /// - Must not contain control characters;
        /// - Must be between 1 and 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s\p{Cc}](?:[^\p{Cc}]{0,62}[^\s\p{Cc}])?$")
                .expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

define_kind! {
    #[doc = "Kind of service agreed in a [`Contract`]."]
    enum ServiceType {
        #[doc = "Floor covering."]
        Flooring = 1,

        #[doc = "Wall tiling."]
        Tiling = 2,

        #[doc = "Both floor covering and wall tiling."]
        Both = 3,
    }
}

define_kind! {
    #[doc = "Status of a [`Contract`]."]
    enum Status {
        #[doc = "Work is in progress."]
        Active = 1,

        #[doc = "Work is suspended."]
        Paused = 2,

        #[doc = "Work is finished."]
        Closed = 3,
    }
}

/// Contracted [`Area`] of each floor of a [`Contract`].
///
/// Exchanged and stored as a JSON object keyed by the floor number, like
/// `{"1": "300", "2": "280.5"}`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AreaByFloor(BTreeMap<unit::Floor, Area>);

impl AreaByFloor {
    /// Creates a new [`AreaByFloor`] out of the provided `floors`.
    ///
    /// # Errors
    ///
    /// If any of the floors is zero.
    pub fn new(
        floors: impl IntoIterator<Item = (unit::Floor, Area)>,
    ) -> Result<Self, AreaByFloorError> {
        floors
            .into_iter()
            .map(|(floor, area)| {
                if floor == 0 {
                    Err(AreaByFloorError::InvalidFloor(floor.to_string()))
                } else {
                    Ok((floor, area))
                }
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }

    /// Parses an [`AreaByFloor`] out of its JSON representation.
    ///
    /// Keys must be positive integers, values must be non-negative numbers
    /// (either JSON numbers or numeric strings) not exceeding [`Area::MAX`].
    ///
    /// # Errors
    ///
    /// If the provided JSON doesn't represent a valid [`AreaByFloor`].
    pub fn from_json(json: &Json) -> Result<Self, AreaByFloorError> {
        use AreaByFloorError as E;

        let Json::Object(map) = json else {
            return Err(E::NotAnObject);
        };
        map.iter()
            .map(|(key, val)| {
                let floor = key
                    .trim()
                    .parse::<unit::Floor>()
                    .ok()
                    .filter(|f| *f > 0)
                    .ok_or_else(|| E::InvalidFloor(key.clone()))?;
                let area = match val {
                    Json::Number(n) => parse_decimal(&n.to_string()),
                    Json::String(s) => parse_decimal(s),
                    Json::Null
                    | Json::Bool(_)
                    | Json::Array(_)
                    | Json::Object(_) => None,
                }
                .and_then(Area::new)
                .ok_or(E::InvalidArea(floor))?;
                Ok((floor, area))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }

    /// Returns the JSON representation of this [`AreaByFloor`].
    #[must_use]
    pub fn to_json(&self) -> Json {
        Json::Object(
            self.0
                .iter()
                .map(|(floor, area)| {
                    (floor.to_string(), Json::String(area.to_string()))
                })
                .collect::<Map<_, _>>(),
        )
    }

    /// Returns the contracted [`Area`] of the provided `floor`, if any.
    #[must_use]
    pub fn get(&self, floor: unit::Floor) -> Option<Area> {
        self.0.get(&floor).copied()
    }

    /// Returns the sum of all the floor [`Area`]s.
    #[must_use]
    pub fn total(&self) -> Area {
        self.0.values().sum()
    }

    /// Indicates whether no floor is contracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the contracted floors in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (unit::Floor, Area)> + '_ {
        self.0.iter().map(|(f, a)| (*f, *a))
    }
}

/// Parses a [`Decimal`] written either in plain or scientific notation.
fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

#[cfg(feature = "postgres")]
mod postgres {
    //! [`AreaByFloor`] integration with Postgres `JSONB` columns.

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };
    use serde_json::Value as Json;

    use super::AreaByFloor;

    impl<'a> FromSql<'a> for AreaByFloor {
        accepts!(JSON, JSONB);

        fn from_sql(
            ty: &Type,
            raw: &'a [u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Self::from_json(&Json::from_sql(ty, raw)?).map_err(Box::from)
        }
    }

    impl ToSql for AreaByFloor {
        accepts!(JSON, JSONB);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            self.to_json().to_sql(ty, w)
        }
    }
}

/// Error of parsing an [`AreaByFloor`].
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
pub enum AreaByFloorError {
    /// Provided JSON is not an object.
    #[display("floors must be a JSON object keyed by floor number")]
    NotAnObject,

    /// Floor key is not a positive integer.
    #[display("`{_0}` is not a valid floor number")]
    InvalidFloor(#[error(not(source))] String),

    /// Floor area is not a non-negative number, or is too large.
    #[display(
        "area of floor {_0} must be a non-negative number not exceeding {}",
        Area::MAX,
    )]
    InvalidArea(#[error(not(source))] unit::Floor),
}

/// [`DateTime`] when a [`Contract`] was created.
pub type CreationDateTime = DateTimeOf<(Contract, marker::Creation)>;

/// [`DateTime`] when a [`Contract`] was modified last time.
pub type ModificationDateTime = DateTimeOf<(Contract, marker::Modification)>;

/// [`DateTime`] when a [`Contract`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Contract, marker::Deletion)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Area;
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::{AreaByFloor, AreaByFloorError, Number};

    fn area(s: &str) -> Area {
        Area::from_str(s).unwrap()
    }

    #[test]
    fn parses_area_by_floor() {
        let floors =
            AreaByFloor::from_json(&json!({"1": 300, "2": "120.5", "10": 0}))
                .unwrap();

        assert_eq!(floors.get(1), Some(area("300")));
        assert_eq!(floors.get(2), Some(area("120.5")));
        assert_eq!(floors.get(10), Some(Area::ZERO));
        assert_eq!(floors.get(3), None);
        assert_eq!(floors.total(), area("420.5"));
        assert_eq!(
            floors.iter().map(|(f, _)| f).collect::<Vec<_>>(),
            [1, 2, 10],
        );
    }

    #[test]
    fn rejects_malformed_area_by_floor() {
        assert_eq!(
            AreaByFloor::from_json(&json!([300])),
            Err(AreaByFloorError::NotAnObject),
        );
        assert_eq!(
            AreaByFloor::from_json(&json!({"0": 10})),
            Err(AreaByFloorError::InvalidFloor("0".into())),
        );
        assert_eq!(
            AreaByFloor::from_json(&json!({"first": 10})),
            Err(AreaByFloorError::InvalidFloor("first".into())),
        );
        assert_eq!(
            AreaByFloor::from_json(&json!({"2": -1})),
            Err(AreaByFloorError::InvalidArea(2)),
        );
        assert_eq!(
            AreaByFloor::from_json(&json!({"3": "lots"})),
            Err(AreaByFloorError::InvalidArea(3)),
        );
        assert_eq!(
            AreaByFloor::from_json(&json!({"4": "5e28"})),
            Err(AreaByFloorError::InvalidArea(4)),
        );
    }

    #[test]
    fn keeps_precision_in_json() {
        let floors =
            AreaByFloor::new([(1, area("33.333")), (2, area("66.667"))])
                .unwrap();

        let json = floors.to_json();
        assert_eq!(json, json!({"1": "33.333", "2": "66.667"}));
        assert_eq!(AreaByFloor::from_json(&json).unwrap(), floors);
        assert_eq!(floors.total().decimal(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn rejects_zero_floor() {
        assert!(AreaByFloor::new([(0, area("1"))]).is_err());
    }

    #[test]
    fn validates_number() {
        assert!(Number::new("CT-2024/001").is_some());
        assert!(Number::new("CT 2024 001").is_some());
        assert!(Number::new("Nº 15 (A)").is_some());
        assert!(Number::new("7").is_some());
        assert!(Number::new("x".repeat(64)).is_some());

        assert!(Number::new("").is_none());
        assert!(Number::new(" CT-1").is_none());
        assert!(Number::new("CT-1 ").is_none());
        assert!(Number::new("CT\n1").is_none());
        assert!(Number::new("x".repeat(65)).is_none());
    }
}
