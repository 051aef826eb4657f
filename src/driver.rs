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

//! Business logic for the service.

use crate::clocks::Clock;
use crate::db::{Db, DbError};
use std::sync::Arc;

mod record;
mod records;
#[cfg(test)]
pub(crate) mod testutils;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected database errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),
}

impl From<DbError> for DriverError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::AlreadyExists => DriverError::AlreadyExists(e.to_string()),
            DbError::BackendError(_) => DriverError::BackendError(e.to_string()),
            DbError::DataIntegrityError(_) => DriverError::BackendError(e.to_string()),
            DbError::NotFound => DriverError::NotFound(e.to_string()),
            DbError::Unavailable => DriverError::BackendError(e.to_string()),
        }
    }
}

/// Result type for this module.
pub(crate) type DriverResult<T> = Result<T, DriverError>;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction when they need one, so it's incorrect for the caller to use two separate calls.
/// For this reason, these operations consume the driver in an attempt to minimize the
/// possibility of executing two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// The clock used to stamp creation and modification times.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        Self { db, clock }
    }
}
