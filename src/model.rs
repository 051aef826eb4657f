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

//! High-level data types for the records service.

use derive_getters::Getters;
use serde::{de::Visitor, Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;
use uuid::Uuid;

/// Maximum length of a record title as specified in the schema.
pub(crate) const RECORDS_MAX_TITLE_LENGTH: usize = 255;

/// Principal recorded in the audit columns while real identity propagation does not exist.
pub(crate) const SYSTEM_PRINCIPAL: &str = "system";

/// Problems converting raw data into model types.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct ModelError(pub(crate) String);

/// Result type for this module.
pub(crate) type ModelResult<T> = Result<T, ModelError>;

/// Unique identifier of a record, assigned by the storage layer at creation time.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(transparent)]
pub(crate) struct RecordId(Uuid);

impl RecordId {
    /// Creates an identifier from an untrusted string `s`, making sure it is a valid UUID.
    pub(crate) fn new<S: AsRef<str>>(s: S) -> ModelResult<Self> {
        match Uuid::parse_str(s.as_ref()) {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("Invalid record id: {}", e))),
        }
    }

    /// Generates a fresh random identifier.  Collisions with previously-issued identifiers are
    /// not possible by construction.
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the raw UUID backing this identifier.
    pub(crate) fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for RecordId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A deserialization visitor for a `RecordId`.
struct RecordIdVisitor;

impl Visitor<'_> for RecordIdVisitor {
    type Value = RecordId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a UUID string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        RecordId::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(RecordIdVisitor)
    }
}

/// Represents a valid record title: non-blank and bounded in length.
#[derive(Clone, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(transparent)]
pub(crate) struct Title(String);

impl Title {
    /// Creates a new title from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.trim().is_empty() {
            return Err(ModelError("Title is required".to_owned()));
        }
        if s.chars().count() > RECORDS_MAX_TITLE_LENGTH {
            return Err(ModelError("Title must be less than 255 characters".to_owned()));
        }

        Ok(Self(s))
    }

    /// Returns a string view of the title.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A deserialization visitor for a `Title`.
struct TitleVisitor;

impl Visitor<'_> for TitleVisitor {
    type Value = Title;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Title::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Title::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Title {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(TitleVisitor)
    }
}

/// Represents valid record content: non-blank free-form text of unbounded length.
#[derive(Clone, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(transparent)]
pub(crate) struct Content(String);

impl Content {
    /// Creates new content from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.trim().is_empty() {
            return Err(ModelError("Content is required".to_owned()));
        }

        Ok(Self(s))
    }

    /// Returns a string view of the content.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A deserialization visitor for a `Content`.
struct ContentVisitor;

impl Visitor<'_> for ContentVisitor {
    type Value = Content;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Content::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Content::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(ContentVisitor)
    }
}

/// Lifecycle status of a record.
///
/// The full member set of the status enumeration is not under our control, so this is an open
/// tag: any non-blank value loaded from storage is accepted, and `draft` is the only value this
/// service ever assigns.
#[derive(Clone, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Debug))]
#[serde(transparent)]
pub(crate) struct RecordStatus(String);

impl RecordStatus {
    /// Creates a status from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.trim().is_empty() {
            return Err(ModelError("Status cannot be empty".to_owned()));
        }

        Ok(Self(s))
    }

    /// Returns the status assigned to newly-created records.
    pub(crate) fn draft() -> Self {
        Self("DRAFT".to_owned())
    }

    /// Returns a string view of the status tag.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A deserialization visitor for a `RecordStatus`.
struct RecordStatusVisitor;

impl Visitor<'_> for RecordStatusVisitor {
    type Value = RecordStatus;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        RecordStatus::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        RecordStatus::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for RecordStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(RecordStatusVisitor)
    }
}

/// A record as stored in the database and as exposed over the wire.
///
/// Instances are immutable outside of the storage layer: the only mutation path is `touch`,
/// which exists because the update hook must refresh `updated_at`, and which remains unused
/// until an update API exists.
#[derive(Clone, Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
#[serde(rename_all = "camelCase")]
pub(crate) struct Record {
    /// Unique identifier of the record.
    id: RecordId,

    /// Title of the record.
    title: Title,

    /// Free-form content of the record.
    content: Content,

    /// Lifecycle status of the record.
    status: RecordStatus,

    /// Principal that created the record.
    created_by: String,

    /// Time at which the record was created.  Never changes after creation.
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,

    /// Principal that last modified the record.
    updated_by: String,

    /// Time of the last modification.  Equals `created_at` until a modification happens.
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Record {
    /// Creates a record from its parts, filling `updated_at` with `created_at` when absent and
    /// validating that the timestamps are ordered.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: RecordId,
        title: Title,
        content: Content,
        status: RecordStatus,
        created_by: String,
        created_at: OffsetDateTime,
        updated_by: String,
        updated_at: Option<OffsetDateTime>,
    ) -> ModelResult<Self> {
        let updated_at = updated_at.unwrap_or(created_at);
        if updated_at < created_at {
            return Err(ModelError(format!(
                "Record {} cannot have been updated at {} before its creation at {}",
                id, updated_at, created_at
            )));
        }
        Ok(Self { id, title, content, status, created_by, created_at, updated_by, updated_at })
    }

    /// Registers a modification by `updated_by` at time `now`, refreshing `updated_at`.
    ///
    /// No API currently modifies records, so this is only reachable from tests.
    #[cfg(test)]
    pub(crate) fn touch(&mut self, updated_by: String, now: OffsetDateTime) {
        self.updated_by = updated_by;
        self.updated_at = now;
    }
}
