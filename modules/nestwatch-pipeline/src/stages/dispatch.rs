use std::sync::Arc;

use nestwatch_common::NestwatchError;

use crate::tasks::Task;
use crate::traits::{FeedSource, Geocoder, Notifier, Store, TaskQueue};

use super::{aggregate, alert, enrich};

/// Shared collaborators handed to every stage handler.
#[derive(Clone)]
pub struct PipelineDeps {
    pub store: Arc<dyn Store>,
    pub queue: Arc<dyn TaskQueue>,
    pub geocoder: Arc<dyn Geocoder>,
    pub feeds: Arc<dyn FeedSource>,
    pub notifier: Arc<dyn Notifier>,
}

/// Route one task to its handler by kind. An `Err` tells the queue to
/// redeliver the task; handlers that drop work return `Ok`.
pub async fn dispatch(task: &Task, deps: &PipelineDeps) -> Result<(), NestwatchError> {
    match task {
        Task::Enrich(t) => enrich::run(t, deps).await,
        Task::Aggregate(t) => aggregate::run(t, deps).await,
        Task::Alert(t) => alert::run(t, deps).await,
        Task::Notify(t) => deps
            .notifier
            .send(&t.recipient, &t.subject, &t.body)
            .await
            .map_err(NestwatchError::from),
    }
}
