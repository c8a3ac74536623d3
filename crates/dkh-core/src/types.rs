//! Domain types for the DKH admin dashboard

use crate::value::{Fields, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a document, unique within its collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a new document identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of the signed-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque user identifier issued by the auth service
    pub uid: String,
    /// Display email, when the account has one
    pub email: Option<String>,
}

impl Session {
    /// Create a new session
    pub fn new(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            uid: uid.into(),
            email,
        }
    }
}

/// One document of a collection, materialized locally.
///
/// The identifier travels beside the fields and is never one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Document identifier
    pub id: DocumentId,
    /// Field values in document order
    pub fields: Fields,
}

impl Record {
    /// Create a record from an identifier and its fields
    pub fn new(id: impl Into<DocumentId>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Builder-style field setter
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// The record's `status` field, when it holds a known status
    pub fn status(&self) -> Option<EntryStatus> {
        self.get(EntryStatus::FIELD).and_then(EntryStatus::from_value)
    }
}

/// Review state of a consultation entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Waiting for review
    Pending,
    /// Newly arrived
    New,
    /// Handled by the operator
    Reviewed,
}

impl EntryStatus {
    /// Name of the document field holding the status
    pub const FIELD: &'static str = "status";

    /// Every status, in selector order
    pub const ALL: [Self; 3] = [Self::Pending, Self::New, Self::Reviewed];

    /// Stored representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::New => "new",
            Self::Reviewed => "reviewed",
        }
    }

    /// Human-readable label for selectors
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::New => "New",
            Self::Reviewed => "Reviewed",
        }
    }

    /// Read a status out of a field value
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(|s| s.parse().ok())
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "new" => Ok(Self::New),
            "reviewed" => Ok(Self::Reviewed),
            other => Err(crate::Error::UnknownStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl From<EntryStatus> for Value {
    fn from(status: EntryStatus) -> Self {
        Self::String(status.as_str().to_string())
    }
}
