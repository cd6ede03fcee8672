//! Producer task: fetch one user, normalize it, publish it

use crate::broker::Publisher;
use crate::error::Result;
use crate::record::{normalize, NormalizedUserRecord};
use crate::source::UserSource;
use tracing::info;

/// Run one producer tick
///
/// Errors propagate unchanged and nothing is retried; the caller decides
/// whether a failed tick matters.
pub async fn produce_once(
    source: &dyn UserSource,
    publisher: &Publisher,
) -> Result<NormalizedUserRecord> {
    let raw = source.fetch().await?;
    let record = normalize(&raw)?;
    publisher.publish(&record).await?;

    info!(topic = %publisher.topic(), "Producer tick complete");
    Ok(record)
}
