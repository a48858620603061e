//! [`Unit`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{block, development, unit, Unit},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::unit::{DistributedIn, HasExecutions, OnFloor},
};

use super::get_u16;

/// Columns of the `units` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, development_id, block_id, block_name, floor, label, kind, \
    typology, total_area, notes, created_at";

/// Builds a [`Unit`] out of the provided [`Row`].
fn from_row(row: &Row) -> Unit {
    Unit {
        id: row.get("id"),
        development_id: row.get("development_id"),
        block_id: row.get("block_id"),
        block_name: row.get("block_name"),
        floor: get_u16(row, "floor"),
        label: row.get("label"),
        kind: row.get("kind"),
        typology: row.get("typology"),
        total_area: row.get("total_area"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<unit::Id, Unit>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[unit::Id]>,
{
    type Ok = HashMap<unit::Id, Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<unit::Id, Unit>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[unit::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM units \
             WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
             LIMIT $2::INT4",
        );
        Ok(self
            .query(sql.as_str(), &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let unit = from_row(row);
                (unit.id, unit)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Unit>, unit::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<unit::Id, Unit>, [unit::Id; 1]>>,
        Ok = HashMap<unit::Id, Unit>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Unit>, unit::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Unit>, development::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Unit>, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let development_id: development::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM units \
             WHERE development_id = $1::UUID \
             ORDER BY block_name, floor, kind, label",
        );
        Ok(self
            .query(sql.as_str(), &[&development_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Unit>, block::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Unit>, block::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let block_id: block::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM units \
             WHERE block_id = $1::UUID \
             ORDER BY floor, kind, label",
        );
        Ok(self
            .query(sql.as_str(), &[&block_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Unit>, OnFloor>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Unit>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Unit>, OnFloor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let OnFloor {
            development_id,
            floor,
            kind,
        } = by.into_inner();
        let floor = i32::from(floor);

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM units \
             WHERE development_id = $1::UUID \
               AND floor = $2::INT4 \
               AND kind = $3::INT2 \
             ORDER BY block_name, label",
        );
        Ok(self
            .query(sql.as_str(), &[&development_id, &floor, &kind])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C, IDs> Database<Select<By<HasExecutions, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[unit::Id]>,
{
    type Ok = HasExecutions;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HasExecutions, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[unit::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HasExecutions(false));
        }

        const SQL: &str = "\
            SELECT id \
            FROM executions \
            WHERE unit_id = ANY($1::UUID[]) \
            LIMIT 1";
        self.query_opt(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())
            .map(|r| HasExecutions(r.is_some()))
    }
}

impl<C, IDs> Database<Select<By<DistributedIn, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[unit::Id]>,
{
    type Ok = DistributedIn;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<DistributedIn, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[unit::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(DistributedIn::default());
        }

        const SQL: &str = "\
            SELECT DISTINCT c.number \
            FROM distributions AS d \
            INNER JOIN contracts AS c ON c.id = d.contract_id \
            WHERE d.unit_id = ANY($1::UUID[]) \
              AND c.deleted_at IS NULL \
            ORDER BY c.number";
        Ok(DistributedIn(
            self.query(SQL, &[&ids])
                .await
                .map_err(tracerr::wrap!())?
                .iter()
                .map(|row| row.get("number"))
                .collect(),
        ))
    }
}

impl<C> Database<Insert<Unit>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(unit): Insert<Unit>,
    ) -> Result<Self::Ok, Self::Err> {
        let Unit {
            id,
            development_id,
            block_id,
            block_name,
            floor,
            label,
            kind,
            typology,
            total_area,
            notes,
            created_at,
        } = unit;

        let floor = i32::from(floor);

        // Violates `units_address_key` if the address is taken already.
        let sql = format!(
            "INSERT INTO units ({COLUMNS}) \
             VALUES (\
                 $1::UUID, $2::UUID, $3::UUID, $4::VARCHAR, \
                 $5::INT4, $6::VARCHAR, $7::INT2, \
                 $8::VARCHAR, $9::NUMERIC, $10::VARCHAR, \
                 $11::TIMESTAMPTZ\
             )",
        );
        self.exec(
            sql.as_str(),
            &[
                &id,
                &development_id,
                &block_id,
                &block_name,
                &floor,
                &label,
                &kind,
                &typology,
                &total_area,
                &notes,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Insert<Vec<Unit>>> for Postgres<C>
where
    C: Connection,
{
    /// Number of actually inserted [`Unit`]s.
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(units): Insert<Vec<Unit>>,
    ) -> Result<Self::Ok, Self::Err> {
        if units.is_empty() {
            return Ok(0);
        }

        let (
            ids,
            development_ids,
            block_ids,
            block_names,
            floors,
            labels,
            kinds,
            typologies,
            total_areas,
            notes,
            created_ats,
        ): (
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
            Vec<_>,
        ) = units
            .into_iter()
            .map(|u| {
                (
                    u.id,
                    u.development_id,
                    u.block_id,
                    u.block_name,
                    i32::from(u.floor),
                    u.label,
                    u.kind,
                    u.typology,
                    u.total_area,
                    u.notes,
                    u.created_at,
                )
            })
            .multiunzip();

        // Already existing addresses are skipped, so concurrent generations
        // of the same `Block` converge.
        let sql = format!(
            "INSERT INTO units ({COLUMNS}) \
             SELECT * \
             FROM unnest(\
                 $1::UUID[], $2::UUID[], $3::UUID[], $4::VARCHAR[], \
                 $5::INT4[], $6::VARCHAR[], $7::INT2[], \
                 $8::VARCHAR[], $9::NUMERIC[], $10::VARCHAR[], \
                 $11::TIMESTAMPTZ[]\
             ) \
             ON CONFLICT ON CONSTRAINT units_address_key DO NOTHING",
        );
        self.exec(
            sql.as_str(),
            &[
                &ids,
                &development_ids,
                &block_ids,
                &block_names,
                &floors,
                &labels,
                &kinds,
                &typologies,
                &total_areas,
                &notes,
                &created_ats,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Unit>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(unit): Update<Unit>,
    ) -> Result<Self::Ok, Self::Err> {
        let Unit {
            id,
            typology,
            total_area,
            notes,
            ..
        } = unit;

        // Placement of a `Unit` is immutable.
        const SQL: &str = "\
            UPDATE units \
            SET typology = $2::VARCHAR, \
                total_area = $3::NUMERIC, \
                notes = $4::VARCHAR \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &typology, &total_area, &notes])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C, IDs> Database<Lock<By<Vec<Unit>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[unit::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vec<Unit>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[unit::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(());
        }

        // Recording an `Execution` takes a key share lock on its `Unit`, so
        // it waits for this one to be released.
        const SQL: &str = "\
            SELECT id \
            FROM units \
            WHERE id = ANY($1::UUID[]) \
            ORDER BY id \
            FOR UPDATE";
        self.query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C, IDs> Database<Delete<By<Vec<Unit>, IDs>>> for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[unit::Id]>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<Unit>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[unit::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(());
        }

        const SQL: &str = "\
            DELETE FROM units \
            WHERE id = ANY($1::UUID[])";
        self.exec(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
