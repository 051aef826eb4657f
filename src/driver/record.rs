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

//! Operations on individual records.

use crate::db::{self, DbError};
use crate::driver::{Driver, DriverError, DriverResult};
use crate::model::{Content, Record, RecordId, RecordStatus, Title, SYSTEM_PRINCIPAL};

impl Driver {
    /// Creates a new record with the given `title` and `content` and returns it with its
    /// server-assigned fields filled in.
    ///
    /// New records always start in the draft status and are attributed to the system principal
    /// because there is no authentication layer yet.
    pub(crate) async fn create_record(self, title: Title, content: Content) -> DriverResult<Record> {
        let now = self.clock.now_utc();

        let mut tx = self.db.begin().await?;
        let record = db::create_record(
            tx.ex(),
            title,
            content,
            RecordStatus::draft(),
            SYSTEM_PRINCIPAL,
            now,
        )
        .await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Fetches the record with identifier `id`.
    pub(crate) async fn get_record(self, id: &RecordId) -> DriverResult<Record> {
        match db::get_record(&mut self.db.ex().await?, id).await {
            Ok(record) => Ok(record),
            Err(DbError::NotFound) => {
                Err(DriverError::NotFound(format!("Record not found with id: {}", id)))
            }
            Err(e) => Err(DriverError::from(e)),
        }
    }
}
