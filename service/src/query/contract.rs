//! [`Query`] collection related to [`Contract`]s.

use std::collections::HashMap;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{contract, development, Contract, Development},
    infra::{database, Database},
    read::{
        self,
        contract::{Details, ExecutedArea},
    },
    Service,
};

use super::Query;

/// Queries a [`Contract`] by its ID along with its progress.
///
/// Deleted [`Contract`]s are not returned.
#[derive(Clone, Copy, Debug)]
pub struct ById(pub contract::Id);

impl<Db> Query<ById> for Service<Db>
where
    Db: Database<
            Select<By<Option<Contract>, contract::Id>>,
            Ok = Option<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Development>, development::Id>>,
            Ok = Option<Development>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<contract::Id, ExecutedArea>, [contract::Id; 1]>>,
            Ok = HashMap<contract::Id, ExecutedArea>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<Details>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        ById(id): ById,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(contract) = self
            .database()
            .execute(Select(By::<Option<Contract>, _>::new(id)))
            .await
            .map_err(tracerr::wrap!())?
            .filter(|c| !c.is_deleted())
        else {
            return Ok(None);
        };

        let Some(development) = self
            .database()
            .execute(Select(By::<Option<Development>, _>::new(
                contract.development_id,
            )))
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        let executed = self
            .database()
            .execute(Select(
                By::<HashMap<contract::Id, ExecutedArea>, _>::new([id]),
            ))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id)
            .unwrap_or_default();

        Ok(Some(Details::new(contract, development.name, executed)))
    }
}

/// Queries a list of [`Contract`]s along with their progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct List(pub read::contract::Filter);

impl<Db> Query<List> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Contract>, read::contract::Filter>>,
            Ok = Vec<Contract>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<HashMap<development::Id, Development>, Vec<development::Id>>,
            >,
            Ok = HashMap<development::Id, Development>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<contract::Id, ExecutedArea>, Vec<contract::Id>>>,
            Ok = HashMap<contract::Id, ExecutedArea>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Details>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        List(filter): List,
    ) -> Result<Self::Ok, Self::Err> {
        let contracts = self
            .database()
            .execute(Select(By::new(filter)))
            .await
            .map_err(tracerr::wrap!())?;
        if contracts.is_empty() {
            return Ok(Vec::new());
        }

        let mut development_ids = contracts
            .iter()
            .map(|c| c.development_id)
            .collect::<Vec<_>>();
        development_ids.sort_unstable();
        development_ids.dedup();
        let developments = self
            .database()
            .execute(Select(
                By::<HashMap<development::Id, Development>, _>::new(
                    development_ids,
                ),
            ))
            .await
            .map_err(tracerr::wrap!())?;

        let mut executed = self
            .database()
            .execute(Select(
                By::<HashMap<contract::Id, ExecutedArea>, _>::new(
                    contracts.iter().map(|c| c.id).collect::<Vec<_>>(),
                ),
            ))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(contracts
            .into_iter()
            .filter_map(|c| {
                let name = developments.get(&c.development_id)?.name.clone();
                let area = executed.remove(&c.id).unwrap_or_default();
                Some(Details::new(c, name, area))
            })
            .collect())
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Area, Date, Percent};
    use futures::executor::block_on;
    use rust_decimal::Decimal;

    use crate::{
        command::{
            save_distribution::NewEntry, DeleteContract, RecordExecution,
            SaveDistribution,
        },
        domain::{block, contract, execution::Responsible},
        infra::database::memory::MemoryDb,
        read, Command, Query,
    };

    use super::{ById, List};

    #[test]
    fn reports_percent_executed() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let block = db.add_block(
            development,
            block::Layout::new(1, 2, false, 0).unwrap(),
        );
        let units = db.generate_units(block);
        let contract = db.add_contract(development, &[(1, "150")]);
        let svc = db.service();

        let details =
            block_on(Query::execute(&svc, ById(contract))).unwrap().unwrap();
        assert_eq!(details.percent_executed, Percent::ZERO);
        assert_eq!(details.executed_area, Area::ZERO);

        _ = block_on(Command::execute(
            &svc,
            SaveDistribution {
                contract_id: contract,
                entries: units
                    .iter()
                    .map(|id| NewEntry {
                        unit_id: *id,
                        area: Area::from_str("75").unwrap(),
                        coefficient: None,
                    })
                    .collect(),
            },
        ))
        .unwrap();
        for (unit_id, area) in units.iter().zip([40, 35]) {
            _ = block_on(Command::execute(
                &svc,
                RecordExecution {
                    contract_id: contract,
                    unit_id: *unit_id,
                    area: Decimal::from(area),
                    measured_on: Some(
                        Date::from_calendar(2024, 7, 1).unwrap(),
                    ),
                    responsible: Responsible::new("Equipe Souza").unwrap(),
                    notes: None,
                },
            ))
            .unwrap();
        }

        let details =
            block_on(Query::execute(&svc, ById(contract))).unwrap().unwrap();
        assert_eq!(details.executed_area, Area::from_str("75").unwrap());
        assert_eq!(details.percent_executed.decimal(), Decimal::from(50));
        assert_eq!(details.development_name.as_ref(), "Residencial Aurora");
    }

    #[test]
    fn hides_deleted_contract() {
        let db = MemoryDb::default();
        let development = db.add_development();
        let deleted = db.add_contract(development, &[(1, "100")]);
        let kept = db.add_contract(development, &[(1, "80")]);
        let svc = db.service();

        _ = block_on(Command::execute(&svc, DeleteContract { id: deleted }))
            .unwrap();

        assert!(block_on(Query::execute(&svc, ById(deleted)))
            .unwrap()
            .is_none());
        assert!(block_on(Query::execute(&svc, ById(contract::Id::new())))
            .unwrap()
            .is_none());

        let listed = block_on(Query::execute(
            &svc,
            List(read::contract::Filter::default()),
        ))
        .unwrap();
        assert_eq!(
            listed.iter().map(|d| d.contract.id).collect::<Vec<_>>(),
            [kept],
        );
    }
}
