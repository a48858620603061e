//! [`Unit`]-related definitions.

use common::{Area, DateTime};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api, api::scalar, Context};

/// An apartment or a hall of a `Block` floor.
#[derive(Clone, Debug, From)]
pub struct Unit(domain::Unit);

/// An addressable piece of a `Block` floor: an apartment or a hall.
#[graphql_object(context = Context)]
impl Unit {
    /// Unique identifier of this `Unit`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Unit.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// ID of the `Development` this `Unit` belongs to.
    pub fn development_id(&self) -> api::development::Id {
        self.0.development_id.into()
    }

    /// ID of the `Block` this `Unit` belongs to.
    pub fn block_id(&self) -> api::block::Id {
        self.0.block_id.into()
    }

    /// Name of the `Block` this `Unit` belongs to.
    pub fn block_name(&self) -> api::block::Name {
        self.0.block_name.clone().into()
    }

    /// Floor this `Unit` is located on, starting from `1`.
    pub fn floor(&self) -> i32 {
        self.0.floor.into()
    }

    /// Label of this `Unit`, unique on its floor.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Unit.label",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn label(&self) -> Label {
        self.0.label.clone().into()
    }

    /// Kind of this `Unit`.
    pub fn kind(&self) -> Kind {
        self.0.kind.into()
    }

    /// Typology of this `Unit`, if known.
    pub fn typology(&self) -> Option<Typology> {
        self.0.typology.clone().map(Into::into)
    }

    /// Total floor area of this `Unit`, if known.
    pub fn total_area(&self) -> Option<Area> {
        self.0.total_area
    }

    /// Notes about this `Unit`, if any.
    pub fn notes(&self) -> Option<api::Notes> {
        self.0.notes.clone().map(Into::into)
    }

    /// `DateTime` when this `Unit` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Unit`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::unit::Id)]
#[into(domain::unit::Id)]
#[graphql(name = "UnitId", transparent)]
pub struct Id(Uuid);

/// Label of a `Unit` on its floor, like `302` or `Hall`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "UnitLabel", with = scalar::Via::<domain::unit::Label>)]
pub struct Label(domain::unit::Label);

/// Typology of a `Unit`, like `2 bedrooms`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UnitTypology",
    with = scalar::Via::<domain::unit::Typology>,
)]
pub struct Typology(domain::unit::Typology);

/// Kind of a `Unit`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "UnitKind")]
pub enum Kind {
    /// A private apartment.
    Apartment,

    /// A common hall of a floor.
    Hall,
}

impl From<domain::unit::Kind> for Kind {
    fn from(kind: domain::unit::Kind) -> Self {
        use domain::unit::Kind as K;
        match kind {
            K::Apartment => Self::Apartment,
            K::Hall => Self::Hall,
        }
    }
}

impl From<Kind> for domain::unit::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Apartment => Self::Apartment,
            Kind::Hall => Self::Hall,
        }
    }
}

pub mod generation {
    //! Definitions related to the `Unit`s generation.

    use juniper::GraphQLObject;
    use service::command::generate_units;

    use crate::api;

    /// Converts the provided counter into a GraphQL `Int`, saturating it.
    fn int(n: usize) -> i32 {
        i32::try_from(n).unwrap_or(i32::MAX)
    }

    /// Result of the `Unit`s generation.
    #[derive(Clone, Debug, GraphQLObject)]
    #[graphql(name = "UnitGenerationResult")]
    pub struct Outcome {
        /// Number of `Unit`s implied by the succeeded `Block` layouts.
        pub considered: i32,

        /// Number of newly created `Unit`s.
        pub inserted: i32,

        /// Number of `Unit`s skipped as already existing.
        pub skipped: i32,

        /// Results of every processed `Block`, ordered by `Block` name.
        pub blocks: Vec<BlockOutcome>,
    }

    impl From<generate_units::Outcome> for Outcome {
        fn from(outcome: generate_units::Outcome) -> Self {
            let total = outcome.total();
            Self {
                considered: int(total.considered),
                inserted: int(total.inserted),
                skipped: int(total.skipped),
                blocks: outcome.blocks.into_iter().map(Into::into).collect(),
            }
        }
    }

    /// Result of the `Unit`s generation for a single `Block`.
    #[derive(Clone, Debug, GraphQLObject)]
    #[graphql(name = "UnitGenerationBlockResult")]
    pub struct BlockOutcome {
        /// ID of the `Block`.
        pub block_id: api::block::Id,

        /// Name of the `Block`.
        pub block_name: api::block::Name,

        /// Number of `Unit`s implied by the `Block` layout.
        ///
        /// Zero if the generation failed.
        pub considered: i32,

        /// Number of newly created `Unit`s.
        pub inserted: i32,

        /// Number of `Unit`s skipped as already existing.
        pub skipped: i32,

        /// Error the generation of this `Block` failed with, if any.
        ///
        /// No `Unit`s of a failed `Block` are created.
        pub error: Option<String>,
    }

    impl From<generate_units::BlockOutcome> for BlockOutcome {
        fn from(outcome: generate_units::BlockOutcome) -> Self {
            let generate_units::BlockOutcome {
                block_id,
                block_name,
                result,
            } = outcome;
            let (generated, error) = match result {
                Ok(generated) => (generated, None),
                Err(e) => (generate_units::Generated::default(), Some(e)),
            };
            Self {
                block_id: block_id.into(),
                block_name: block_name.into(),
                considered: int(generated.considered),
                inserted: int(generated.inserted),
                skipped: int(generated.skipped),
                error: error.map(|e| e.as_ref().to_string()),
            }
        }
    }

    #[cfg(test)]
    mod spec {
        use service::{
            command::generate_units::{self, Generated},
            domain::block,
        };

        use super::Outcome;

        #[test]
        fn sums_up_succeeded_blocks() {
            let outcome = Outcome::from(generate_units::Outcome {
                blocks: vec![
                    generate_units::BlockOutcome {
                        block_id: block::Id::new(),
                        block_name: block::Name::numbered(1),
                        result: Ok(Generated {
                            considered: 50,
                            inserted: 40,
                            skipped: 10,
                        }),
                    },
                    generate_units::BlockOutcome {
                        block_id: block::Id::new(),
                        block_name: block::Name::numbered(2),
                        result: Ok(Generated {
                            considered: 50,
                            inserted: 50,
                            skipped: 0,
                        }),
                    },
                ],
            });

            assert_eq!(outcome.considered, 100);
            assert_eq!(outcome.inserted, 90);
            assert_eq!(outcome.skipped, 10);
            assert_eq!(outcome.blocks.len(), 2);
            assert!(outcome.blocks.iter().all(|b| b.error.is_none()));
        }
    }
}
