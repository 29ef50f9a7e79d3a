//! Feed synchronization: the entry stage of the pipeline.

use tracing::{info, warn};
use uuid::Uuid;

use nestwatch_common::NestwatchError;

use crate::parser::parse_item;
use crate::stages::PipelineDeps;
use crate::tasks::{AggregateTask, AlertTask, EnrichTask, QueueName, Task};

/// Per-sync diagnostic counts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub accepted: u32,
    pub rejected: u32,
    pub already_seen: u32,
}

/// Sync every stored list. A failing list never aborts its siblings.
pub async fn sync_all(deps: &PipelineDeps) -> Result<(), NestwatchError> {
    let lists = deps.store.all_lists().await?;
    for list in lists {
        if let Err(e) = sync_list(list.id, deps).await {
            warn!(list = %list.id, error = %e, "List sync failed");
        }
    }
    Ok(())
}

/// Sync one list: enqueue an Enrich task per new item, then an Aggregate and
/// an Alert task on the same queue once all item tasks are in. Single-queue
/// FIFO ordering guarantees every Post is persisted before aggregation and
/// alert matching run for this sync.
pub async fn sync_list(list_id: Uuid, deps: &PipelineDeps) -> Result<SyncReport, NestwatchError> {
    let mut list = deps
        .store
        .get_list(list_id)
        .await?
        .ok_or_else(|| NestwatchError::NotFound(format!("list {list_id}")))?;

    let items = deps
        .feeds
        .fetch(&list)
        .await
        .map_err(|e| NestwatchError::Feed(e.to_string()))?;

    let prior = list.last_synced;
    let mut latest = prior;
    let mut prices = Vec::new();
    let mut report = SyncReport::default();

    for raw in &items {
        let parsed = match parse_item(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                report.rejected += 1;
                warn!(link = raw.link.as_str(), error = %e, "Feed item rejected");
                continue;
            }
        };

        prices.push(parsed.price);

        // Not strictly newer than the last sync: already seen on a prior run.
        if parsed.created <= prior {
            report.already_seen += 1;
            continue;
        }
        if parsed.created > latest {
            latest = parsed.created;
        }

        deps.queue
            .enqueue(
                QueueName::Pipeline,
                Task::Enrich(EnrichTask {
                    list_id,
                    title: parsed.title,
                    description: parsed.description,
                    link: parsed.link,
                    price: parsed.price,
                    created: parsed.created,
                    address: parsed.address.text,
                    address_precise: parsed.address.precise,
                }),
            )
            .await?;
        report.accepted += 1;
    }

    if latest > prior {
        deps.queue
            .enqueue(
                QueueName::Pipeline,
                Task::Aggregate(AggregateTask { list_id, prices }),
            )
            .await?;
        // The alert window opens at the previous sync point, not at latest.
        deps.queue
            .enqueue(
                QueueName::Pipeline,
                Task::Alert(AlertTask {
                    list_id,
                    since: prior,
                }),
            )
            .await?;

        list.last_synced = latest;
        deps.store.put_list(&list).await?;
    }

    info!(
        list = %list_id,
        accepted = report.accepted,
        rejected = report.rejected,
        already_seen = report.already_seen,
        "Feed sync complete"
    );
    Ok(report)
}
