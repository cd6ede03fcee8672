//! Record types
//!
//! The three shapes a user takes on its way through the pipeline.

use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw upstream record, as returned by the source API
///
/// No schema is enforced; the normalizer accesses fields by key path.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUserRecord(JsonValue);

impl RawUserRecord {
    /// Wrap an upstream JSON value
    pub fn new(value: JsonValue) -> Self {
        Self(value)
    }

    /// Look up a dotted key path (e.g. `location.street.name`)
    pub fn get_path(&self, path: &str) -> Option<&JsonValue> {
        path.split('.')
            .try_fold(&self.0, |current, key| current.get(key))
    }
}

impl From<JsonValue> for RawUserRecord {
    fn from(value: JsonValue) -> Self {
        Self::new(value)
    }
}

/// Flat user record carried through the broker topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedUserRecord {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub address: String,
    pub postcode: String,
    pub email: String,
    pub username: String,
    pub dob: String,
    pub registered_date: String,
    pub phone: String,
    pub picture: String,
}

impl NormalizedUserRecord {
    /// Column names in table order, excluding `id`
    pub const FIELDS: [&'static str; 11] = [
        "first_name",
        "last_name",
        "gender",
        "address",
        "postcode",
        "email",
        "username",
        "dob",
        "registered_date",
        "phone",
        "picture",
    ];

    /// Field values in the same order as [`Self::FIELDS`]
    pub fn values(&self) -> [&str; 11] {
        [
            &self.first_name,
            &self.last_name,
            &self.gender,
            &self.address,
            &self.postcode,
            &self.email,
            &self.username,
            &self.dob,
            &self.registered_date,
            &self.phone,
            &self.picture,
        ]
    }

    /// Serialize to the UTF-8 JSON payload published on the topic
    pub fn to_payload(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A decoded record with its storage identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedUserRow {
    pub id: Uuid,
    #[serde(flatten)]
    pub record: NormalizedUserRecord,
}

impl PersistedUserRow {
    /// Attach an id to a record
    pub fn new(id: Uuid, record: NormalizedUserRecord) -> Self {
        Self { id, record }
    }
}
