//! [`Block`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{block, development, Block},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

use super::get_u16;

/// Builds a [`Block`] out of the provided [`Row`].
fn from_row(row: &Row) -> Block {
    let halls_per_floor = get_u16(row, "halls_per_floor");
    Block {
        id: row.get("id"),
        development_id: row.get("development_id"),
        name: row.get("name"),
        layout: block::Layout::new(
            get_u16(row, "floor_count"),
            get_u16(row, "units_per_floor"),
            halls_per_floor > 0,
            halls_per_floor,
        )
        .expect("`Layout` is checked by constraints"),
    }
}

impl<C> Database<Select<By<Vec<Block>, development::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Block>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Block>, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let development_id: development::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, development_id, name, \
                   floor_count, units_per_floor, halls_per_floor \
            FROM blocks \
            WHERE development_id = $1::UUID \
            ORDER BY name";
        Ok(self
            .query(SQL, &[&development_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Option<Block>, block::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Block>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Block>, block::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: block::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, development_id, name, \
                   floor_count, units_per_floor, halls_per_floor \
            FROM blocks \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Block>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Block>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(block): Insert<Block>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(block)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Block>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(block): Update<Block>,
    ) -> Result<Self::Ok, Self::Err> {
        let Block {
            id,
            development_id,
            name,
            layout,
        } = block;

        let floor_count = i32::from(layout.floor_count());
        let units_per_floor = i32::from(layout.units_per_floor());
        let halls_per_floor = i32::from(layout.halls_per_floor());

        const SQL: &str = "\
            INSERT INTO blocks (\
                id, development_id, name, \
                floor_count, units_per_floor, halls_per_floor\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::INT4, $5::INT4, $6::INT4\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                floor_count = EXCLUDED.floor_count, \
                units_per_floor = EXCLUDED.units_per_floor, \
                halls_per_floor = EXCLUDED.halls_per_floor";
        self.exec(
            SQL,
            &[
                &id,
                &development_id,
                &name,
                &floor_count,
                &units_per_floor,
                &halls_per_floor,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Block, block::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Block, block::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: block::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM blocks \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
