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

//! Test utilities for the driver.

use crate::clocks::testutils::SettableClock;
use crate::db::{init_schema, sqlite, Db};
use crate::driver::Driver;
use std::sync::Arc;
use time::macros::datetime;

/// State of a running driver test, with direct access to the injected components.
pub(crate) struct TestContext {
    /// The database that the driver is backed by.
    pub(crate) db: Arc<dyn Db + Send + Sync>,

    /// The clock that the driver is backed by.
    pub(crate) clock: Arc<SettableClock>,

    /// The driver under test.
    driver: Driver,
}

impl TestContext {
    /// Initializes a driver backed by an in-memory database and a settable clock.
    pub(crate) async fn setup() -> Self {
        let db: Arc<dyn Db + Send + Sync> = Arc::from(sqlite::testutils::setup().await);
        init_schema(&mut db.ex().await.unwrap()).await.unwrap();

        let clock = Arc::from(SettableClock::new(datetime!(2024-06-10 12:00:00 UTC)));

        let driver = Driver::new(db.clone(), clock.clone());

        TestContext { db, clock, driver }
    }

    /// Returns a new driver instance for a one-shot operation.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }
}
