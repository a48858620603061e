//! [`Execution`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Area,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        contract,
        execution::{self, Approval},
        Execution,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::contract::ExecutedArea,
};

/// Columns of the `executions` table, in the order [`from_row()`] expects
/// them.
const COLUMNS: &str = "\
    id, contract_id, unit_id, area, measured_on, responsible, notes, \
    approved_by, approved_at, created_at";

/// Builds an [`Execution`] out of the provided [`Row`].
fn from_row(row: &Row) -> Execution {
    Execution {
        id: row.get("id"),
        contract_id: row.get("contract_id"),
        unit_id: row.get("unit_id"),
        area: row.get("area"),
        measured_on: row.get("measured_on"),
        responsible: row.get("responsible"),
        notes: row.get("notes"),
        approval: row.get::<_, Option<_>>("approved_by").map(|approver| {
            Approval {
                approver,
                approved_at: row.get("approved_at"),
            }
        }),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Execution>, execution::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Execution>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Execution>, execution::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: execution::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM executions \
             WHERE id = $1::UUID",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Execution>, contract::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Execution>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Execution>, contract::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let contract_id: contract::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM executions \
             WHERE contract_id = $1::UUID \
             ORDER BY measured_on DESC, created_at DESC",
        );
        Ok(self
            .query(sql.as_str(), &[&contract_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C, IDs> Database<Select<By<HashMap<contract::Id, ExecutedArea>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[contract::Id]>,
{
    type Ok = HashMap<contract::Id, ExecutedArea>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<contract::Id, ExecutedArea>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[contract::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT contract_id, SUM(area) AS executed \
            FROM executions \
            WHERE contract_id = ANY($1::UUID[]) \
            GROUP BY contract_id";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                (
                    row.get("contract_id"),
                    ExecutedArea(row.get::<_, Area>("executed")),
                )
            })
            .collect())
    }
}

impl<C> Database<Insert<Execution>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Execution>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(execution): Insert<Execution>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(execution))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Execution>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(execution): Update<Execution>,
    ) -> Result<Self::Ok, Self::Err> {
        let Execution {
            id,
            contract_id,
            unit_id,
            area,
            measured_on,
            responsible,
            notes,
            approval,
            created_at,
        } = execution;

        let (approved_by, approved_at) = approval
            .map(|a| (a.approver, a.approved_at))
            .unzip();

        // Only the approval of a recorded `Execution` may change.
        let sql = format!(
            "INSERT INTO executions ({COLUMNS}) \
             VALUES (\
                 $1::UUID, $2::UUID, $3::UUID, $4::NUMERIC, $5::DATE, \
                 $6::VARCHAR, $7::VARCHAR, \
                 $8::VARCHAR, $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
             ) \
             ON CONFLICT (id) DO UPDATE \
             SET approved_by = EXCLUDED.approved_by, \
                 approved_at = EXCLUDED.approved_at",
        );
        self.exec(
            sql.as_str(),
            &[
                &id,
                &contract_id,
                &unit_id,
                &area,
                &measured_on,
                &responsible,
                &notes,
                &approved_by,
                &approved_at,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Execution, execution::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Execution, execution::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: execution::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM executions \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
