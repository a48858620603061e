//! [`Contract`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contract, Contract},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `contracts` table, in the order [`from_row()`] expects
/// them.
const COLUMNS: &str = "\
    id, number, development_id, service_type, \
    total_value, total_value_currency, \
    value_per_area, value_per_area_currency, \
    total_area, area_by_floor, status, notes, \
    starts_on, expected_end_on, \
    created_at, updated_at, deleted_at";

/// Builds a [`Contract`] out of the provided [`Row`].
fn from_row(row: &Row) -> Contract {
    Contract {
        id: row.get("id"),
        number: row.get("number"),
        development_id: row.get("development_id"),
        service_type: row.get("service_type"),
        total_value: Money {
            amount: row.get("total_value"),
            currency: row.get("total_value_currency"),
        },
        value_per_area: row.get::<_, Option<_>>("value_per_area").map(
            |amount| Money {
                amount,
                currency: row.get("value_per_area_currency"),
            },
        ),
        total_area: row.get("total_area"),
        area_by_floor: row.get("area_by_floor"),
        status: row.get("status"),
        notes: row.get("notes"),
        starts_on: row.get("starts_on"),
        expected_end_on: row.get("expected_end_on"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<contract::Id, Contract>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[contract::Id]>,
{
    type Ok = HashMap<contract::Id, Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<contract::Id, Contract>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[contract::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(sql.as_str(), &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let contract = from_row(row);
                (contract.id, contract)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<contract::Id, Contract>, [contract::Id; 1]>>,
        Ok = HashMap<contract::Id, Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Option<Contract>, contract::Number>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Contract>, contract::Id>>,
        Ok = Option<Contract>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Contract>, contract::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: contract::Number = by.into_inner();

        // Deleted `Contract`s keep their numbers taken.
        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE number = $1::VARCHAR \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Contract>, read::contract::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Contract>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Contract>, read::contract::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::contract::Filter { active_only } = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM contracts \
             WHERE deleted_at IS NULL \
               AND (status = $1::INT2 OR NOT $2::BOOLEAN) \
             ORDER BY created_at DESC, id",
        );
        Ok(self
            .query(sql.as_str(), &[&contract::Status::Active, &active_only])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Contract>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Contract>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(contract): Insert<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(contract)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Contract>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(contract): Update<Contract>,
    ) -> Result<Self::Ok, Self::Err> {
        let Contract {
            id,
            number,
            development_id,
            service_type,
            total_value,
            value_per_area,
            total_area,
            area_by_floor,
            status,
            notes,
            starts_on,
            expected_end_on,
            created_at,
            updated_at,
            deleted_at,
        } = contract;

        let value_per_area_currency = value_per_area.map(|m| m.currency);
        let value_per_area = value_per_area.map(|m| m.amount);

        // Violates `contracts_number_key` if the number is taken already.
        let sql = format!(
            "INSERT INTO contracts ({COLUMNS}) \
             VALUES (\
                 $1::UUID, $2::VARCHAR, $3::UUID, $4::INT2, \
                 $5::NUMERIC, $6::INT2, \
                 $7::NUMERIC, $8::INT2, \
                 $9::NUMERIC, $10::JSONB, $11::INT2, $12::VARCHAR, \
                 $13::DATE, $14::DATE, \
                 $15::TIMESTAMPTZ, $16::TIMESTAMPTZ, $17::TIMESTAMPTZ\
             ) \
             ON CONFLICT (id) DO UPDATE \
             SET number = EXCLUDED.number, \
                 service_type = EXCLUDED.service_type, \
                 total_value = EXCLUDED.total_value, \
                 total_value_currency = EXCLUDED.total_value_currency, \
                 value_per_area = EXCLUDED.value_per_area, \
                 value_per_area_currency = EXCLUDED.value_per_area_currency, \
                 total_area = EXCLUDED.total_area, \
                 area_by_floor = EXCLUDED.area_by_floor, \
                 status = EXCLUDED.status, \
                 notes = EXCLUDED.notes, \
                 starts_on = EXCLUDED.starts_on, \
                 expected_end_on = EXCLUDED.expected_end_on, \
                 updated_at = EXCLUDED.updated_at, \
                 deleted_at = EXCLUDED.deleted_at",
        );
        self.exec(
            sql.as_str(),
            &[
                &id,
                &number,
                &development_id,
                &service_type,
                &total_value.amount,
                &total_value.currency,
                &value_per_area,
                &value_per_area_currency,
                &total_area,
                &area_by_floor,
                &status,
                &notes,
                &starts_on,
                &expected_end_on,
                &created_at,
                &updated_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Contract, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Contract, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: contract::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM contracts \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
