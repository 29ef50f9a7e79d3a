//! Scheduled retention sweep over ingested posts.

use chrono::{Duration, Utc};
use tracing::info;

use nestwatch_common::NestwatchError;

use crate::traits::Store;

/// Default retention window for ingested posts.
pub const DEFAULT_RETENTION_DAYS: i64 = 7;

/// Delete posts older than the retention window. Invoked by an external
/// scheduler, not by the task queue.
pub async fn run(store: &dyn Store, retention_days: i64) -> Result<u64, NestwatchError> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    let deleted = store.delete_posts_before(cutoff).await?;
    info!(deleted, retention_days, "Outdated posts removed");
    Ok(deleted)
}
