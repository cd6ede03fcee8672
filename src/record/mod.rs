//! User record module
//!
//! Record shapes and the pure transformations between them.
//!
//! # Overview
//!
//! - `RawUserRecord` - nested upstream JSON, unvalidated
//! - `NormalizedUserRecord` - flat record carried on the topic
//! - `PersistedUserRow` - normalized record plus its storage id
//! - `normalize` - raw → normalized
//! - `decode_payload` / `IdAssigner` - topic payload → persisted row

mod decode;
mod normalize;
mod types;

pub use decode::{decode_payload, decode_row, natural_key_id, IdAssigner};
pub use normalize::{compose_address, normalize};
pub use types::{NormalizedUserRecord, PersistedUserRow, RawUserRecord};
