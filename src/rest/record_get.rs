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

//! API to fetch a single record.

use crate::driver::Driver;
use crate::model::RecordId;
use crate::rest::{EmptyBody, RestResult};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<RecordId>,
    _body: EmptyBody,
) -> RestResult<impl IntoResponse> {
    let record = driver.get_record(&id).await?;
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use crate::model::{Record, RecordId};
    use crate::rest::testutils::*;

    fn route(id: &str) -> (http::Method, String) {
        (http::Method::GET, format!("/records/{}", id))
    }

    #[tokio::test]
    async fn test_get_ok() {
        let context = TestContext::setup().await;

        let inserted = context.insert_record("First", "The content").await;

        let response = OneShotBuilder::new(context.app(), route(&inserted.id().to_string()))
            .send_empty()
            .await
            .expect_json::<Record>()
            .await;
        assert_eq!(inserted, response);
    }

    #[tokio::test]
    async fn test_get_is_idempotent() {
        let context = TestContext::setup().await;

        let inserted = context.insert_record("First", "The content").await;

        let first = OneShotBuilder::new(context.app(), route(&inserted.id().to_string()))
            .send_empty()
            .await
            .expect_json::<Record>()
            .await;
        let second = OneShotBuilder::new(context.app(), route(&inserted.id().to_string()))
            .send_empty()
            .await
            .expect_json::<Record>()
            .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let context = TestContext::setup().await;
        let _unrelated = context.insert_record("First", "The content").await;

        let id = RecordId::random();
        OneShotBuilder::new(context.app(), route(&id.to_string()))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_error(&format!("^Record not found with id: {}$", id))
            .await;
    }

    #[tokio::test]
    async fn test_get_malformed_id() {
        let context = TestContext::setup().await;

        // Path deserialization errors are not funneled through RestError, so the body is plain
        // text instead of an ErrorResponse.
        OneShotBuilder::new(context.app(), route("this-is-not-a-uuid"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_text("Invalid record id")
            .await;
    }

    test_payload_must_be_empty!(
        crate::rest::testutils::TestContext::setup().await.app(),
        route(&crate::model::RecordId::random().to_string())
    );
}
