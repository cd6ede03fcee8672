//! Topic payload decoding and identity assignment

use super::types::{NormalizedUserRecord, PersistedUserRow};
use crate::error::{Error, Result};
use crate::types::IdStrategy;
use uuid::Uuid;

/// Decode a topic payload against the fixed record schema
///
/// All eleven fields must be present, non-null, non-empty strings. An `id`
/// key (older producers sent one) and unknown keys are ignored. Nothing is
/// coerced: any deviation is a [`Error::SchemaMismatch`].
pub fn decode_payload(payload: &[u8]) -> Result<NormalizedUserRecord> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| Error::schema_mismatch(format!("payload is not UTF-8: {e}")))?;

    let record: NormalizedUserRecord = serde_json::from_str(text)
        .map_err(|e| Error::schema_mismatch(format!("payload does not match schema: {e}")))?;

    if let Some(field) = NormalizedUserRecord::FIELDS
        .iter()
        .zip(record.values())
        .find_map(|(name, value)| value.trim().is_empty().then_some(*name))
    {
        return Err(Error::schema_mismatch(format!(
            "field '{field}' must not be empty"
        )));
    }

    Ok(record)
}

/// Assigns primary keys to decoded records
#[derive(Debug, Clone, Copy, Default)]
pub struct IdAssigner {
    strategy: IdStrategy,
}

impl IdAssigner {
    /// Create an assigner for the given strategy
    pub fn new(strategy: IdStrategy) -> Self {
        Self { strategy }
    }

    /// Produce the id for a record
    pub fn id_for(&self, record: &NormalizedUserRecord) -> Uuid {
        match self.strategy {
            IdStrategy::Deterministic => natural_key_id(record),
            IdStrategy::Random => Uuid::new_v4(),
        }
    }

    /// Attach an id, producing a row ready for storage
    pub fn assign(&self, record: NormalizedUserRecord) -> PersistedUserRow {
        let id = self.id_for(&record);
        PersistedUserRow::new(id, record)
    }
}

/// UUIDv5 over `username` and `registered_date`
pub fn natural_key_id(record: &NormalizedUserRecord) -> Uuid {
    // unit separator keeps ("ab","c") and ("a","bc") apart
    let name = format!("{}\u{1f}{}", record.username, record.registered_date);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Decode a payload and assign its id in one step
pub fn decode_row(payload: &[u8], ids: &IdAssigner) -> Result<PersistedUserRow> {
    decode_payload(payload).map(|record| ids.assign(record))
}
