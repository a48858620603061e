//! Distribution-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, distribution::Entry, unit},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

use super::get_u16;

/// Builds an [`Entry`] out of the provided [`Row`].
fn from_row(row: &Row) -> Entry {
    Entry {
        contract_id: row.get("contract_id"),
        unit_id: row.get("unit_id"),
        block_name: row.get("block_name"),
        floor: get_u16(row, "floor"),
        area: row.get("area"),
        coefficient: row.get("coefficient"),
    }
}

impl<C> Database<Select<By<Option<Entry>, (contract::Id, unit::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Entry>, (contract::Id, unit::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (contract_id, unit_id) = by.into_inner();

        const SQL: &str = "\
            SELECT contract_id, unit_id, block_name, floor, \
                   area, coefficient \
            FROM distributions \
            WHERE contract_id = $1::UUID \
              AND unit_id = $2::UUID";
        Ok(self
            .query_opt(SQL, &[&contract_id, &unit_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<read::distribution::Line>, contract::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<read::distribution::Line>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<read::distribution::Line>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT d.contract_id, d.unit_id, d.block_name, d.floor, \
                   d.area, d.coefficient, \
                   u.label, u.kind \
            FROM distributions AS d \
            INNER JOIN units AS u ON u.id = d.unit_id \
            WHERE d.contract_id = $1::UUID \
            ORDER BY d.block_name, d.floor, u.kind, u.label";
        Ok(self
            .query(SQL, &[&contract_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| read::distribution::Line {
                entry: from_row(row),
                unit_label: row.get("label"),
                unit_kind: row.get("kind"),
            })
            .collect())
    }
}

impl<C> Database<Delete<By<Vec<Entry>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<Entry>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM distributions \
            WHERE contract_id = $1::UUID";
        self.exec(SQL, &[&contract_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Insert<Vec<Entry>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entries): Insert<Vec<Entry>>,
    ) -> Result<Self::Ok, Self::Err> {
        if entries.is_empty() {
            return Ok(());
        }

        let (contract_ids, unit_ids, block_names, floors, areas, coefficients): (
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
        ) = entries
            .into_iter()
            .map(|e| {
                (
                    e.contract_id,
                    e.unit_id,
                    e.block_name,
                    i32::from(e.floor),
                    e.area,
                    e.coefficient,
                )
            })
            .multiunzip();

        const SQL: &str = "\
            INSERT INTO distributions (\
                contract_id, unit_id, block_name, floor, area, coefficient\
            ) \
            SELECT * \
            FROM unnest(\
                $1::UUID[], $2::UUID[], $3::VARCHAR[], \
                $4::INT4[], $5::NUMERIC[], $6::NUMERIC[]\
            )";
        self.exec(
            SQL,
            &[
                &contract_ids,
                &unit_ids,
                &block_names,
                &floors,
                &areas,
                &coefficients,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
