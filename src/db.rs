// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction in terms of the operations needed by the server.
//!
//! The facilities in this module provide an abstraction over different database systems.  The
//! PostgreSQL backend is for production use and the SQLite backend is primarily intended to
//! support unit tests.

use crate::model::{Content, ModelError, Record, RecordId, RecordStatus, Title};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::Row;
use time::OffsetDateTime;

pub mod postgres;
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// This type provides a generic mechanism to access a typed instance of a database, which is
/// needed by sqlx to offer type safety guarantees during query compilation.  Users of this type
/// are forced to destructure it and issue different calls for each database.
///
/// Note that this can wrap an executor that talks directly to a pool or to an open transaction.
pub enum Executor {
    /// A PostgreSQL executor that can be used in `sqlx` operations.
    Postgres(postgres::PostgresExecutor),

    /// A SQLite executor that can be used in `sqlx` operations.
    Sqlite(sqlite::SqliteExecutor),
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            Executor::Postgres(e) => e.commit().await,
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.
    /// Otherwise the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the connection pool, flushing any pending operations.
    async fn close(&self);
}

/// Initializes the schema of the database that `ex` points to.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, postgres::SCHEMA).await,
        Executor::Sqlite(ex) => sqlite::run_schema(ex, sqlite::SCHEMA).await,
    }
}

/// Creates a record with a fresh storage-assigned identifier and persists it.
///
/// The caller supplies every field except the identifier, which this layer assigns and which is
/// collision-free by construction.  Both timestamps are set to `now`.  Returns the fully
/// populated record as stored.
pub(crate) async fn create_record(
    ex: &mut Executor,
    title: Title,
    content: Content,
    status: RecordStatus,
    author: &str,
    now: OffsetDateTime,
) -> DbResult<Record> {
    let record = Record::new(
        RecordId::random(),
        title,
        content,
        status,
        author.to_owned(),
        now,
        author.to_owned(),
        None,
    )?;

    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO records
                    (id, title, content, status, created_by, created_at, updated_by, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ";
            let done = sqlx::query(query_str)
                .bind(record.id().as_uuid())
                .bind(record.title().as_str())
                .bind(record.content().as_str())
                .bind(record.status().as_str())
                .bind(record.created_by())
                .bind(record.created_at())
                .bind(record.updated_by())
                .bind(record.updated_at())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError("Insert affected more than one row".to_owned()));
            }
        }

        Executor::Sqlite(ex) => {
            let (created_sec, created_nsec) = sqlite::unpack_timestamp(*record.created_at());
            let (updated_sec, updated_nsec) = sqlite::unpack_timestamp(*record.updated_at());

            let query_str = "
                INSERT INTO records
                    (id, title, content, status, created_by, created_sec, created_nsec,
                     updated_by, updated_sec, updated_nsec)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ";
            let done = sqlx::query(query_str)
                .bind(record.id().to_string())
                .bind(record.title().as_str())
                .bind(record.content().as_str())
                .bind(record.status().as_str())
                .bind(record.created_by())
                .bind(created_sec)
                .bind(created_nsec)
                .bind(record.updated_by())
                .bind(updated_sec)
                .bind(updated_nsec)
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError("Insert affected more than one row".to_owned()));
            }
        }
    }

    Ok(record)
}

/// Gets the record identified by `id`, or `DbError::NotFound` if it does not exist.
pub(crate) async fn get_record(ex: &mut Executor, id: &RecordId) -> DbResult<Record> {
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, title, content, status, created_by, created_at, updated_by, updated_at
                FROM records WHERE id = $1
            ";
            let row = sqlx::query(query_str)
                .bind(id.as_uuid())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            postgres_record_from_row(&row)
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, title, content, status, created_by, created_sec, created_nsec,
                    updated_by, updated_sec, updated_nsec
                FROM records WHERE id = ?
            ";
            let row = sqlx::query(query_str)
                .bind(id.to_string())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            sqlite_record_from_row(&row)
        }
    }
}

/// Gets every stored record in creation order.
pub(crate) async fn get_records(ex: &mut Executor) -> DbResult<Vec<Record>> {
    let mut records = vec![];
    match ex {
        Executor::Postgres(ex) => {
            let query_str = "
                SELECT id, title, content, status, created_by, created_at, updated_by, updated_at
                FROM records ORDER BY created_at, id
            ";
            let mut rows = sqlx::query(query_str).fetch(ex);
            while let Some(row) = rows.try_next().await.map_err(postgres::map_sqlx_error)? {
                records.push(postgres_record_from_row(&row)?);
            }
        }

        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id, title, content, status, created_by, created_sec, created_nsec,
                    updated_by, updated_sec, updated_nsec
                FROM records ORDER BY created_sec, created_nsec, id
            ";
            let mut rows = sqlx::query(query_str).fetch(ex);
            while let Some(row) = rows.try_next().await.map_err(sqlite::map_sqlx_error)? {
                records.push(sqlite_record_from_row(&row)?);
            }
        }
    }
    Ok(records)
}

/// Rebuilds a record from a PostgreSQL result row.
fn postgres_record_from_row(row: &sqlx::postgres::PgRow) -> DbResult<Record> {
    let id: uuid::Uuid = row.try_get("id").map_err(postgres::map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(postgres::map_sqlx_error)?;
    let content: String = row.try_get("content").map_err(postgres::map_sqlx_error)?;
    let status: String = row.try_get("status").map_err(postgres::map_sqlx_error)?;
    let created_by: String = row.try_get("created_by").map_err(postgres::map_sqlx_error)?;
    let created_at: OffsetDateTime = row.try_get("created_at").map_err(postgres::map_sqlx_error)?;
    let updated_by: String = row.try_get("updated_by").map_err(postgres::map_sqlx_error)?;
    let updated_at: OffsetDateTime = row.try_get("updated_at").map_err(postgres::map_sqlx_error)?;

    Ok(Record::new(
        RecordId::from(id),
        Title::new(title)?,
        Content::new(content)?,
        RecordStatus::new(status)?,
        created_by,
        created_at,
        updated_by,
        Some(updated_at),
    )?)
}

/// Rebuilds a record from a SQLite result row.
fn sqlite_record_from_row(row: &sqlx::sqlite::SqliteRow) -> DbResult<Record> {
    let id: String = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(sqlite::map_sqlx_error)?;
    let content: String = row.try_get("content").map_err(sqlite::map_sqlx_error)?;
    let status: String = row.try_get("status").map_err(sqlite::map_sqlx_error)?;
    let created_by: String = row.try_get("created_by").map_err(sqlite::map_sqlx_error)?;
    let created_sec: i64 = row.try_get("created_sec").map_err(sqlite::map_sqlx_error)?;
    let created_nsec: i64 = row.try_get("created_nsec").map_err(sqlite::map_sqlx_error)?;
    let updated_by: String = row.try_get("updated_by").map_err(sqlite::map_sqlx_error)?;
    let updated_sec: i64 = row.try_get("updated_sec").map_err(sqlite::map_sqlx_error)?;
    let updated_nsec: i64 = row.try_get("updated_nsec").map_err(sqlite::map_sqlx_error)?;

    Ok(Record::new(
        RecordId::new(id)?,
        Title::new(title)?,
        Content::new(content)?,
        RecordStatus::new(status)?,
        created_by,
        sqlite::build_timestamp(created_sec, created_nsec)?,
        updated_by,
        Some(sqlite::build_timestamp(updated_sec, updated_nsec)?),
    )?)
}
