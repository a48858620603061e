//! [`Development`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{development, Development},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`Development`] out of the provided [`Row`].
fn from_row(row: &Row) -> Development {
    Development {
        id: row.get("id"),
        name: row.get("name"),
        notes: row.get("notes"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<development::Id, Development>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[development::Id]>,
{
    type Ok = HashMap<development::Id, Development>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<development::Id, Development>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[development::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let limit = i32::try_from(ids.len()).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT id, name, notes, is_active, created_at \
            FROM developments \
            WHERE id IN (SELECT unnest($1::UUID[]) LIMIT $2::INT4) \
            LIMIT $2::INT4";
        Ok(self
            .query(SQL, &[&ids, &limit])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let development = from_row(row);
                (development.id, development)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Development>, development::Id>>>
    for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<development::Id, Development>, [development::Id; 1]>>,
        Ok = HashMap<development::Id, Development>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Development>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Development>, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id))
    }
}

impl<C> Database<Select<By<Vec<Development>, read::development::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Development>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Development>, read::development::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::development::Filter { active_only } = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, notes, is_active, created_at \
            FROM developments \
            WHERE is_active OR NOT $1::BOOLEAN \
            ORDER BY name, id";
        Ok(self
            .query(SQL, &[&active_only])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Development>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Development>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(development): Insert<Development>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(development))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Development>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(development): Update<Development>,
    ) -> Result<Self::Ok, Self::Err> {
        let Development {
            id,
            name,
            notes,
            is_active,
            created_at,
        } = development;

        const SQL: &str = "\
            INSERT INTO developments (\
                id, name, notes, is_active, created_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::BOOLEAN, \
                $5::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                notes = EXCLUDED.notes, \
                is_active = EXCLUDED.is_active";
        self.exec(SQL, &[&id, &name, &notes, &is_active, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Development, development::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Development, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: development::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM developments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Development, development::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Development, development::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: development::Id = by.into_inner();

        // Cascades to everything belonging to the `Development`.
        const SQL: &str = "\
            DELETE FROM developments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
