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

//! API to create a record.

use crate::driver::Driver;
use crate::model::{Content, Title};
use crate::rest::RestError;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

/// Message of the request to create a record.
///
/// The fields are optional so that we can report all validation problems at once instead of
/// failing with a hard-to-diagnose deserialization error when one is missing.
#[derive(Deserialize)]
pub(crate) struct CreateRecordRequest {
    /// Title of the new record.
    title: Option<String>,

    /// Free-form content of the new record.
    content: Option<String>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(request): Json<CreateRecordRequest>,
) -> Result<(http::StatusCode, impl IntoResponse), RestError> {
    let mut problems = vec![];

    let title = match request.title {
        Some(title) => match Title::new(title) {
            Ok(title) => Some(title),
            Err(e) => {
                problems.push(e.to_string());
                None
            }
        },
        None => {
            problems.push("Title is required".to_owned());
            None
        }
    };

    let content = match request.content {
        Some(content) => match Content::new(content) {
            Ok(content) => Some(content),
            Err(e) => {
                problems.push(e.to_string());
                None
            }
        },
        None => {
            problems.push("Content is required".to_owned());
            None
        }
    };

    match (title, content) {
        (Some(title), Some(content)) => {
            let record = driver.create_record(title, content).await?;
            Ok((http::StatusCode::CREATED, Json(record)))
        }
        (_, _) => Err(RestError::InvalidRequest(problems.join("; "))),
    }
}
